use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::NotificationCenter;

/// Whether the page is in the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Background task that refreshes a [`NotificationCenter`] on a fixed
/// interval while the page is visible.
///
/// Ticks that land while hidden are skipped without a network call; coming
/// back into view triggers one immediate refresh. Dropping the poller stops
/// the task.
pub struct NotificationPoller {
    visibility: watch::Sender<Visibility>,
    handle: JoinHandle<()>,
}

impl NotificationPoller {
    /// Must be called from within a tokio runtime. The first refresh happens
    /// one `interval` after start; call [`NotificationCenter::load`] for the
    /// initial list.
    pub fn start(center: Arc<NotificationCenter>, interval: Duration) -> Self {
        let (visibility, receiver) = watch::channel(Visibility::Visible);
        let handle = tokio::spawn(run(center, interval, receiver));

        log::debug!(
            target: "campusgate",
            "msg=\"notification poller started\", interval_ms={}",
            interval.as_millis()
        );
        Self { visibility, handle }
    }

    pub fn set_visibility(&self, visibility: Visibility) {
        self.visibility.send_if_modified(|current| {
            let changed = *current != visibility;
            *current = visibility;
            changed
        });
    }

    pub fn visibility(&self) -> Visibility {
        *self.visibility.borrow()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(
    center: Arc<NotificationCenter>,
    period: Duration,
    mut visibility: watch::Receiver<Visibility>,
) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut previous = *visibility.borrow_and_update();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // a tick and a pending Hidden -> Visible change can be ready
                // together; consume the change here so it polls only once
                let current = *visibility.borrow_and_update();
                previous = current;
                if current == Visibility::Hidden {
                    log::trace!(target: "campusgate", "msg=\"poll skipped, page hidden\"");
                    continue;
                }
                poll(&center).await;
            }
            changed = visibility.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *visibility.borrow_and_update();
                if previous == Visibility::Hidden && current == Visibility::Visible {
                    poll(&center).await;
                    ticker.reset();
                }
                previous = current;
            }
        }
    }
}

async fn poll(center: &NotificationCenter) {
    if let Err(e) = center.refresh().await {
        log::warn!(
            target: "campusgate",
            "msg=\"notification refresh failed\", error=\"{e}\""
        );
    }
}
