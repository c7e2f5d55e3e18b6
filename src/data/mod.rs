//! Remote queries with a mock fallback.
//!
//! Every operation on [`DataService`] returns a [`QueryResult`] and never an
//! `Err`:
//!
//! - no backend configured: the mock payload, flagged `is_mock` (demo mode)
//! - remote read fails: the mock payload, flagged `is_mock`, with the failure
//!   kept in [`QueryResult::diagnostic`] and a
//!   [`PortalEvent::DataDegraded`] dispatched
//! - remote write fails: `success == false` with a sanitized [`ErrorInfo`],
//!   and a [`PortalEvent::OperationFailed`] dispatched
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use campusgate::data::DataService;
//! use campusgate::events::EventRegistry;
//! use mockable::DefaultClock;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let data = DataService::demo(Arc::new(EventRegistry::new()), Arc::new(DefaultClock));
//!
//! let result = data.get_students_count().await;
//! assert!(result.success);
//! assert!(result.is_mock);
//! assert_eq!(result.data, Some(1245));
//! # }
//! ```

mod admin;
mod fixtures;
pub mod models;
mod notifications;
mod sanitize;
mod search;
mod student;
mod teacher;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use admin::DEFAULT_ACTIVITY_LIMIT;
pub use models::*;
pub use notifications::DEFAULT_NOTIFICATION_LIMIT;
pub use sanitize::{
    FORBIDDEN_MESSAGE, GENERIC_MESSAGE, NETWORK_MESSAGE, NOT_FOUND_MESSAGE, SESSION_EXPIRED_MESSAGE,
    TIMEOUT_MESSAGE, sanitize_message,
};
pub use student::{DEFAULT_CHAT_LIMIT, DEFAULT_UPCOMING_EXAMS};

use crate::backend::{RemoteError, RemoteErrorKind, TableClient};
use crate::config::BackendConfig;
use crate::events::{EventRegistry, PortalEvent};

/// A failure that is safe to show to a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    /// `Error: {action}`.
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// What the user was doing, e.g. `Submitting marks`.
    pub action: String,
}

impl ErrorInfo {
    /// Builds an error stamped with the current time. `message` is sanitized.
    pub fn new(action: impl Into<String>, message: &str) -> Self {
        Self::at(action, message, Utc::now())
    }

    pub fn at(action: impl Into<String>, message: &str, timestamp: DateTime<Utc>) -> Self {
        let action = action.into();
        Self {
            title: format!("Error: {action}"),
            message: sanitize_message(message),
            timestamp,
            action,
        }
    }
}

/// How an operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Mock data was served, either in demo mode or after a failed read.
    DegradedMock,
    /// A write failed.
    Failure,
}

/// Uniform envelope for every data operation.
///
/// Serializes as `{ success, data, isMock, error }`; the diagnostic stays
/// in-process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub is_mock: bool,
    pub error: Option<ErrorInfo>,
    /// Why a read fell back to mock data. For logs and diagnostics only.
    #[serde(skip)]
    pub diagnostic: Option<String>,
}

impl<T> QueryResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            is_mock: false,
            error: None,
            diagnostic: None,
        }
    }

    pub fn mock(data: T) -> Self {
        Self {
            is_mock: true,
            ..Self::success(data)
        }
    }

    pub fn degraded(data: T, diagnostic: impl Into<String>) -> Self {
        Self {
            diagnostic: Some(diagnostic.into()),
            ..Self::mock(data)
        }
    }

    pub fn failure(error: ErrorInfo) -> Self {
        Self {
            success: false,
            data: None,
            is_mock: false,
            error: Some(error),
            diagnostic: None,
        }
    }

    pub fn outcome(&self) -> Outcome {
        if !self.success {
            Outcome::Failure
        } else if self.is_mock {
            Outcome::DegradedMock
        } else {
            Outcome::Success
        }
    }

    /// True when the data came from the demo payloads rather than a failed
    /// remote call.
    pub fn is_demo(&self) -> bool {
        self.is_mock && self.diagnostic.is_none()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// Domain queries against the hosted store.
///
/// Construct once at start-up and share by reference.
pub struct DataService {
    client: Option<Arc<dyn TableClient>>,
    events: Arc<EventRegistry>,
    clock: Arc<dyn Clock>,
}

impl DataService {
    /// Uses `client` when `config` is filled in; otherwise runs in demo mode.
    pub fn new(
        config: &BackendConfig,
        client: Arc<dyn TableClient>,
        events: Arc<EventRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if !config.is_valid() {
            log::warn!(
                target: "campusgate",
                "msg=\"backend not configured, serving mock data\""
            );
            return Self::demo(events, clock);
        }

        Self {
            client: Some(client),
            events,
            clock,
        }
    }

    /// Never contacts a backend; every operation returns mock payloads.
    pub fn demo(events: Arc<EventRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client: None,
            events,
            clock,
        }
    }

    /// Builds the REST client from `config`. Falls back to demo mode when
    /// the config is a placeholder or the client cannot be built.
    #[cfg(feature = "rest")]
    pub fn from_config(
        config: &BackendConfig,
        events: Arc<EventRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if !config.is_valid() {
            log::warn!(
                target: "campusgate",
                "msg=\"backend not configured, serving mock data\""
            );
            return Self::demo(events, clock);
        }

        match crate::backend::RestTableClient::new(config) {
            Ok(client) => Self::new(config, Arc::new(client), events, clock),
            Err(e) => {
                log::error!(
                    target: "campusgate",
                    "msg=\"cannot build backend client, serving mock data\", error=\"{e}\""
                );
                Self::demo(events, clock)
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Runs a read, serving `mock` when there is no backend or the remote
    /// call fails.
    async fn read<T, Fut>(
        &self,
        action: &'static str,
        mock: impl FnOnce() -> T,
        remote: impl FnOnce(Arc<dyn TableClient>) -> Fut,
    ) -> QueryResult<T>
    where
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let Some(client) = &self.client else {
            return QueryResult::mock(mock());
        };

        match remote(Arc::clone(client)).await {
            Ok(data) => QueryResult::success(data),
            Err(e) => {
                let diagnostic = e.to_string();
                log::debug!(
                    target: "campusgate",
                    "msg=\"remote read failed, serving mock data\", action=\"{action}\", error=\"{diagnostic}\""
                );
                self.events
                    .dispatch(PortalEvent::DataDegraded {
                        action: action.to_owned(),
                        diagnostic: diagnostic.clone(),
                        at: self.now(),
                    })
                    .await;
                QueryResult::degraded(mock(), diagnostic)
            }
        }
    }

    /// Runs a write. Demo mode echoes `demo` as mock data; a remote failure
    /// is reported, never papered over.
    async fn write<T, Fut>(
        &self,
        action: &'static str,
        demo: impl FnOnce() -> T,
        remote: impl FnOnce(Arc<dyn TableClient>) -> Fut,
    ) -> QueryResult<T>
    where
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let Some(client) = &self.client else {
            log::info!(
                target: "campusgate",
                "msg=\"demo mode, write not sent\", action=\"{action}\""
            );
            return QueryResult::mock(demo());
        };

        match remote(Arc::clone(client)).await {
            Ok(data) => {
                log::info!(
                    target: "campusgate",
                    "msg=\"write succeeded\", action=\"{action}\""
                );
                QueryResult::success(data)
            }
            Err(e) => {
                log::warn!(
                    target: "campusgate",
                    "msg=\"remote write failed\", action=\"{action}\", error=\"{e}\""
                );
                let error = ErrorInfo::at(action, &e.to_string(), self.now());
                self.events
                    .dispatch(PortalEvent::OperationFailed {
                        error: error.clone(),
                    })
                    .await;
                QueryResult::failure(error)
            }
        }
    }
}

fn decode_row<T: DeserializeOwned>(row: Value) -> Result<T, RemoteError> {
    serde_json::from_value(row).map_err(|e| RemoteError::decode(e.to_string()))
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, RemoteError> {
    rows.into_iter().map(decode_row).collect()
}

fn decode_single<T: DeserializeOwned>(rows: Vec<Value>, table: &str) -> Result<T, RemoteError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| RemoteError::not_found(table))
        .and_then(decode_row)
}

fn to_row<P: Serialize>(payload: &P) -> Result<Value, RemoteError> {
    serde_json::to_value(payload)
        .map_err(|e| RemoteError::new(RemoteErrorKind::InvalidRequest, e.to_string()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::DataService;
    use crate::backend::MockTableClient;
    use crate::config::BackendConfig;
    use crate::events::EventRegistry;
    use crate::testing::{ManualClock, RecordingListener};

    pub(crate) struct Harness {
        pub data: DataService,
        pub client: Arc<MockTableClient>,
        pub listener: RecordingListener,
        pub clock: Arc<ManualClock>,
    }

    pub(crate) fn harness() -> Harness {
        let client = Arc::new(MockTableClient::new());
        let listener = RecordingListener::new();
        let mut registry = EventRegistry::new();
        registry.listen(listener.clone());
        let clock = Arc::new(ManualClock::default());

        let data = DataService::new(
            &BackendConfig::new("https://abc.supabase.co", "anon-key"),
            client.clone(),
            Arc::new(registry),
            clock.clone(),
        );

        Harness {
            data,
            client,
            listener,
            clock,
        }
    }

    pub(crate) fn demo() -> (DataService, RecordingListener) {
        let listener = RecordingListener::new();
        let mut registry = EventRegistry::new();
        registry.listen(listener.clone());
        let data = DataService::demo(Arc::new(registry), Arc::new(ManualClock::default()));
        (data, listener)
    }
}
