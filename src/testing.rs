//! In-memory doubles for the platform seams.
//!
//! Available in unit tests and, for downstream crates, behind the `mocks`
//! feature.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;

pub use crate::backend::{MockTableClient, RecordedCall};
use crate::events::{Listener, PortalEvent};
use crate::guard::{ElementError, PageElements, RoleGate, UserInfoSlot};
use crate::session::Navigator;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A clock that only moves when told to.
///
/// Starts at 2026-03-02 12:00:00 UTC unless constructed with [`ManualClock::new`].
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        *lock(&self.0) += delta;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.0) = now;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 2, 12, 0, 0)
            .single()
            .unwrap_or_default();
        Self::new(start)
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

/// Records redirects instead of navigating. The current path stays put
/// unless changed with [`RecordingNavigator::set_path`].
pub struct RecordingNavigator {
    path: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: Mutex::new(path.into()),
            redirects: Mutex::new(Vec::new()),
        }
    }

    pub fn set_path(&self, path: impl Into<String>) {
        *lock(&self.path) = path.into();
    }

    pub fn redirects(&self) -> Vec<String> {
        lock(&self.redirects).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        lock(&self.path).clone()
    }

    fn redirect(&self, to: &str) {
        lock(&self.redirects).push(to.to_owned());
    }
}

/// Keeps every dispatched event. Clones share the same buffer, so one clone
/// can be registered while the test holds the other.
#[derive(Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<PortalEvent>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PortalEvent> {
        lock(&self.events).clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        lock(&self.events).iter().map(PortalEvent::name).collect()
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

#[async_trait]
impl Listener for RecordingListener {
    async fn handle(&self, event: &PortalEvent) {
        lock(&self.events).push(event.clone());
    }
}

/// A page made of named elements.
#[derive(Default)]
pub struct InMemoryPage {
    slots: Vec<UserInfoSlot>,
    gates: Vec<RoleGate>,
    broken: HashSet<String>,
    texts: Mutex<HashMap<String, String>>,
    hidden: Mutex<HashSet<String>>,
}

impl InMemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user_info(mut self, element: &str, key: &str) -> Self {
        self.slots.push(UserInfoSlot {
            element: element.to_owned(),
            key: key.to_owned(),
        });
        self
    }

    #[must_use]
    pub fn with_role_gate(mut self, element: &str, role: &str) -> Self {
        self.gates.push(RoleGate {
            element: element.to_owned(),
            required_role: role.to_owned(),
        });
        self
    }

    /// Every update of `element` fails.
    #[must_use]
    pub fn failing_on(mut self, element: &str) -> Self {
        self.broken.insert(element.to_owned());
        self
    }

    pub fn text(&self, element: &str) -> Option<String> {
        lock(&self.texts).get(element).cloned()
    }

    pub fn is_hidden(&self, element: &str) -> bool {
        lock(&self.hidden).contains(element)
    }

    fn check(&self, element: &str) -> Result<(), ElementError> {
        if self.broken.contains(element) {
            return Err(ElementError(format!("element {element} is detached")));
        }
        Ok(())
    }
}

impl PageElements for InMemoryPage {
    fn user_info_slots(&self) -> Vec<UserInfoSlot> {
        self.slots.clone()
    }

    fn role_gates(&self) -> Vec<RoleGate> {
        self.gates.clone()
    }

    fn set_text(&self, element: &str, text: &str) -> Result<(), ElementError> {
        self.check(element)?;
        lock(&self.texts).insert(element.to_owned(), text.to_owned());
        Ok(())
    }

    fn hide(&self, element: &str) -> Result<(), ElementError> {
        self.check(element)?;
        lock(&self.hidden).insert(element.to_owned());
        Ok(())
    }
}
