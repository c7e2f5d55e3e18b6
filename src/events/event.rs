use chrono::{DateTime, Utc};

use crate::Role;
use crate::data::ErrorInfo;

/// Events emitted by the portal services.
///
/// Events never carry credentials or full phone numbers. Raw remote errors
/// appear only in [`PortalEvent::DataDegraded`] diagnostics, which are not
/// user-visible.
#[derive(Debug, Clone)]
pub enum PortalEvent {
    // session lifecycle
    SessionStarted {
        role: Role,
        at: DateTime<Utc>,
    },
    SessionExpired {
        role: Role,
        at: DateTime<Utc>,
    },
    SessionCleared {
        at: DateTime<Utc>,
    },
    /// A page required a role the current session doesn't have.
    AccessDenied {
        required: Role,
        actual: Role,
        at: DateTime<Utc>,
    },

    // login
    LoginSucceeded {
        role: Role,
        at: DateTime<Utc>,
    },
    LoginFailed {
        role: Role,
        reason: String,
        at: DateTime<Utc>,
    },
    LoginThrottled {
        retry_after: i64,
        at: DateTime<Utc>,
    },
    OtpSent {
        /// Last four digits only.
        phone_suffix: String,
        at: DateTime<Utc>,
    },
    LoggedOut {
        at: DateTime<Utc>,
    },

    // data layer
    /// A read fell back to mock data after a remote failure.
    DataDegraded {
        action: String,
        diagnostic: String,
        at: DateTime<Utc>,
    },
    /// A write failed; the sanitized error is safe to show.
    OperationFailed {
        error: ErrorInfo,
    },
    NotificationsReceived {
        new: usize,
        unread: usize,
        at: DateTime<Utc>,
    },
}

impl PortalEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session.started",
            Self::SessionExpired { .. } => "session.expired",
            Self::SessionCleared { .. } => "session.cleared",
            Self::AccessDenied { .. } => "session.access_denied",
            Self::LoginSucceeded { .. } => "auth.login.success",
            Self::LoginFailed { .. } => "auth.login.failed",
            Self::LoginThrottled { .. } => "auth.login.throttled",
            Self::OtpSent { .. } => "auth.otp.sent",
            Self::LoggedOut { .. } => "auth.logout",
            Self::DataDegraded { .. } => "data.degraded",
            Self::OperationFailed { .. } => "data.operation_failed",
            Self::NotificationsReceived { .. } => "notifications.received",
        }
    }

    /// Returns the timestamp when this event occurred.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::SessionStarted { at, .. }
            | Self::SessionExpired { at, .. }
            | Self::SessionCleared { at }
            | Self::AccessDenied { at, .. }
            | Self::LoginSucceeded { at, .. }
            | Self::LoginFailed { at, .. }
            | Self::LoginThrottled { at, .. }
            | Self::OtpSent { at, .. }
            | Self::LoggedOut { at }
            | Self::DataDegraded { at, .. }
            | Self::NotificationsReceived { at, .. } => *at,
            Self::OperationFailed { error } => error.timestamp,
        }
    }

    /// True for events a user should see (toast, banner).
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::AccessDenied { .. }
                | Self::OperationFailed { .. }
                | Self::LoginFailed { .. }
                | Self::LoginThrottled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let now = Utc::now();

        assert_eq!(
            PortalEvent::SessionExpired {
                role: Role::Teacher,
                at: now
            }
            .name(),
            "session.expired"
        );
        assert_eq!(
            PortalEvent::AccessDenied {
                required: Role::SchoolAdmin,
                actual: Role::Teacher,
                at: now
            }
            .name(),
            "session.access_denied"
        );
        assert_eq!(
            PortalEvent::DataDegraded {
                action: "Loading fees".to_owned(),
                diagnostic: "timeout".to_owned(),
                at: now
            }
            .name(),
            "data.degraded"
        );
    }

    #[test]
    fn test_failure_timestamp_comes_from_error() {
        let error = ErrorInfo::new("Submitting marks", "Request timed out. Please try again.");
        let expected = error.timestamp;

        let event = PortalEvent::OperationFailed { error };
        assert_eq!(event.timestamp(), expected);
    }

    #[test]
    fn test_degraded_reads_are_not_user_visible() {
        let event = PortalEvent::DataDegraded {
            action: "Loading exams".to_owned(),
            diagnostic: "connection refused".to_owned(),
            at: Utc::now(),
        };
        assert!(!event.is_user_visible());

        let event = PortalEvent::OperationFailed {
            error: ErrorInfo::new("Sending message", "Network connection error."),
        };
        assert!(event.is_user_visible());
    }
}
