use async_trait::async_trait;

use crate::events::{Listener, PortalEvent};

/// Logs every event through the `log` crate.
///
/// User-visible events log at `Warn`, everything else at the configured
/// level (default `Info`).
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }

    fn level_for(&self, event: &PortalEvent) -> log::Level {
        if event.is_user_visible() {
            log::Level::Warn
        } else {
            self.level
        }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &PortalEvent) {
        log::log!(
            target: "campusgate::events",
            self.level_for(event),
            "event={} {:?}",
            event.name(),
            event
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::Role;

    #[test]
    fn test_default_level() {
        assert_eq!(LoggingListener::default().level, log::Level::Info);
        assert_eq!(
            LoggingListener::with_level(log::Level::Debug).level,
            log::Level::Debug
        );
    }

    #[test]
    fn test_user_visible_events_escalate() {
        let listener = LoggingListener::with_level(log::Level::Debug);
        let denied = PortalEvent::AccessDenied {
            required: Role::SuperAdmin,
            actual: Role::ParentStudent,
            at: Utc::now(),
        };
        let started = PortalEvent::SessionStarted {
            role: Role::Teacher,
            at: Utc::now(),
        };

        assert_eq!(listener.level_for(&denied), log::Level::Warn);
        assert_eq!(listener.level_for(&started), log::Level::Debug);
    }

    #[tokio::test]
    async fn test_handle() {
        let listener = LoggingListener::new();
        let event = PortalEvent::LoggedOut { at: Utc::now() };

        // should not panic
        listener.handle(&event).await;
    }
}
