use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mockable::Clock;

use super::format;
use crate::PortalError;
use crate::config::PollingConfig;
use crate::data::{DataService, Notification, NotificationCategory, RowId};
use crate::events::{EventRegistry, PortalEvent};
use crate::storage::{BrowserStorage, KeyValueStore, keys, read_json, write_json};

/// A notification raised locally, for example after a successful upload.
#[derive(Debug, Clone, Default)]
pub struct NewNotification {
    pub category: Option<NotificationCategory>,
    pub title: String,
    pub message: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub action_url: Option<String>,
}

impl NewNotification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn category(mut self, category: NotificationCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }
}

/// The bell menu's list: newest first, unique by id, cached in durable
/// storage after every change.
pub struct NotificationCenter {
    data: Arc<DataService>,
    cache: Arc<dyn KeyValueStore>,
    events: Arc<EventRegistry>,
    clock: Arc<dyn Clock>,
    fetch_limit: usize,
    max_kept: usize,
    items: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new(
        data: Arc<DataService>,
        storage: &BrowserStorage,
        events: Arc<EventRegistry>,
        clock: Arc<dyn Clock>,
        config: &PollingConfig,
    ) -> Self {
        Self {
            data,
            cache: Arc::clone(&storage.durable),
            events,
            clock,
            fetch_limit: config.fetch_limit,
            max_kept: config.max_kept,
            items: Mutex::new(Vec::new()),
        }
    }

    fn items(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restores the cached list, then merges in a fresh fetch.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "notifications_load", skip_all, err)
    )]
    pub async fn load(&self) -> Result<usize, PortalError> {
        self.restore_cache();
        self.refresh().await
    }

    /// Replaces the in-memory list with the cached one. A missing or
    /// unreadable cache leaves an empty list.
    pub fn restore_cache(&self) -> usize {
        let cached = match read_json::<Vec<Notification>>(self.cache.as_ref(), keys::NOTIFICATIONS) {
            Ok(cached) => cached.unwrap_or_default(),
            Err(e) => {
                log::warn!(
                    target: "campusgate",
                    "msg=\"ignoring unreadable notification cache\", error=\"{e}\""
                );
                Vec::new()
            }
        };

        let mut cached = cached;
        cached.truncate(self.max_kept);
        let count = cached.len();
        *self.items() = cached;
        count
    }

    /// Fetches the latest notifications and prepends the ones not seen
    /// before. Known ids keep their local read state. Returns how many were
    /// new.
    pub async fn refresh(&self) -> Result<usize, PortalError> {
        let fetched = self
            .data
            .get_notifications(Some(self.fetch_limit))
            .await
            .into_data()
            .unwrap_or_default();

        let (new, unread) = {
            let mut items = self.items();
            let fresh: Vec<Notification> = fetched
                .into_iter()
                .filter(|n| !items.iter().any(|existing| existing.id == n.id))
                .fold(Vec::new(), |mut fresh, n| {
                    if !fresh.iter().any(|f: &Notification| f.id == n.id) {
                        fresh.push(n);
                    }
                    fresh
                });

            let new = fresh.len();
            if new > 0 {
                items.splice(0..0, fresh);
                items.truncate(self.max_kept);
                write_json(self.cache.as_ref(), keys::NOTIFICATIONS, &*items)?;
            }
            (new, unread_in(&items))
        };

        log::debug!(
            target: "campusgate",
            "msg=\"notifications refreshed\", new={new}, unread={unread}"
        );
        if new > 0 {
            self.events
                .dispatch(PortalEvent::NotificationsReceived {
                    new,
                    unread,
                    at: self.clock.utc(),
                })
                .await;
        }

        Ok(new)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.items().clone()
    }

    /// `None` is the "all" filter.
    pub fn filtered(&self, category: Option<NotificationCategory>) -> Vec<Notification> {
        self.items()
            .iter()
            .filter(|n| category.is_none_or(|c| n.category == c))
            .cloned()
            .collect()
    }

    pub fn unread_count(&self) -> usize {
        unread_in(&self.items())
    }

    pub fn badge_text(&self) -> Option<String> {
        format::badge_text(self.unread_count())
    }

    pub fn time_ago(&self, notification: &Notification) -> String {
        format::time_ago(notification.timestamp, self.clock.utc())
    }

    /// Marks one notification read. Returns its action URL, if any, so the
    /// caller can navigate there. Unknown ids are ignored.
    pub fn mark_read(&self, id: &RowId) -> Result<Option<String>, PortalError> {
        let mut items = self.items();
        let Some(notification) = items.iter_mut().find(|n| &n.id == id) else {
            return Ok(None);
        };

        let action_url = notification.action_url.clone();
        if !notification.read {
            notification.read = true;
            write_json(self.cache.as_ref(), keys::NOTIFICATIONS, &*items)?;
        }
        Ok(action_url)
    }

    /// Returns how many were unread.
    pub fn mark_all_read(&self) -> Result<usize, PortalError> {
        let mut items = self.items();
        let mut changed = 0;
        for notification in items.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }

        write_json(self.cache.as_ref(), keys::NOTIFICATIONS, &*items)?;
        Ok(changed)
    }

    pub fn add(&self, notification: NewNotification) -> Result<Notification, PortalError> {
        let now = self.clock.utc();
        let created = Notification {
            id: RowId::Text(format!("N{}", now.timestamp_millis())),
            category: notification.category.unwrap_or_default(),
            title: notification.title,
            message: notification.message,
            timestamp: now,
            read: false,
            icon: notification.icon.unwrap_or_else(|| "fa-info-circle".to_owned()),
            color: notification.color.unwrap_or_else(|| "blue".to_owned()),
            action_url: notification.action_url,
        };

        let mut items = self.items();
        items.insert(0, created.clone());
        items.truncate(self.max_kept);
        write_json(self.cache.as_ref(), keys::NOTIFICATIONS, &*items)?;
        Ok(created)
    }

    pub fn clear_all(&self) -> Result<(), PortalError> {
        let mut items = self.items();
        items.clear();
        write_json(self.cache.as_ref(), keys::NOTIFICATIONS, &*items)
    }
}

fn unread_in(items: &[Notification]) -> usize {
    items.iter().filter(|n| !n.read).count()
}
