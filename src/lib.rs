//! Session, access guard and resilient data access for a multi-role school
//! administration portal.
//!
//! The crate is organised around explicit services that are constructed once
//! at application start and passed by reference to whatever needs them:
//!
//! | Service | Description |
//! |---------|-------------|
//! | [`SessionStore`](session::SessionStore) | Tab-scoped session lifecycle |
//! | [`AccessGuard`](guard::AccessGuard) | Per-page session and role check |
//! | [`DataService`](data::DataService) | Remote queries with mock fallback |
//! | [`GlobalSearch`](search::GlobalSearch) | Debounced search with recent history |
//! | [`NotificationCenter`](notifications::NotificationCenter) | Notification list and visibility-aware poller |
//!
//! Platform capabilities (storage, navigation, page elements, the remote
//! table store) are traits; enable the `mocks` feature for in-memory
//! implementations.

pub mod actions;
pub mod backend;
pub mod config;
pub mod data;
pub mod events;
pub mod guard;
pub mod notifications;
pub mod rate_limit;
pub mod search;
pub mod session;
pub mod storage;
pub mod validators;

mod credentials;
mod secret;

#[cfg(any(test, feature = "mocks"))]
pub mod testing;

use std::fmt;

pub use config::{BackendConfig, PortalConfig};
pub use credentials::{
    AuthenticatedUser, CredentialValidator, Credentials, DemoCredentialValidator, DemoOtpSender,
    OtpSender,
};
pub use data::{DataService, ErrorInfo, Outcome, QueryResult};
pub use events::{EventRegistry, Listener, PortalEvent};
pub use guard::{AccessGuard, GuardOutcome};
pub use notifications::{NotificationCenter, NotificationPoller, Visibility};
pub use search::GlobalSearch;
pub use secret::SecretString;
pub use session::{Role, Session, SessionStore};

#[derive(Debug, Clone, PartialEq)]
pub enum PortalError {
    /// Reading or writing persisted browser state failed.
    StorageError(String),
    SerializationError(String),
    Validation(validators::ValidationError),
    MissingField(&'static str),
    InvalidCredentials,
    /// The action was attempted again before its throttle window elapsed.
    Throttled { retry_after: i64, message: String },
    OtpDeliveryFailed,
    Remote(String),
    /// A service was wired up inconsistently (for example an unregistered
    /// rate limit).
    Configuration(String),
}

impl std::error::Error for PortalError {}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortalError::StorageError(msg) => write!(f, "Storage error: {msg}"),
            PortalError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            PortalError::Validation(err) => write!(f, "{err}"),
            PortalError::MissingField(field) => write!(f, "Please enter your {field}"),
            PortalError::InvalidCredentials => write!(f, "Invalid credentials"),
            PortalError::Throttled { message, .. } => write!(f, "{message}"),
            PortalError::OtpDeliveryFailed => write!(f, "Failed to send OTP. Please try again."),
            PortalError::Remote(msg) => write!(f, "Remote error: {msg}"),
            PortalError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl From<validators::ValidationError> for PortalError {
    fn from(err: validators::ValidationError) -> Self {
        PortalError::Validation(err)
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::SerializationError(err.to_string())
    }
}
