//! The hosted table store, seen through a small query interface.
//!
//! Rows travel as JSON values; the data layer decodes them into its own
//! records. [`TableClient`] is the only seam between the portal and the
//! network. Enable the `rest` feature for [`RestTableClient`], or `mocks`
//! for an in-memory [`MockTableClient`].

#[cfg(any(test, feature = "mocks"))]
mod mock;
#[cfg(feature = "rest")]
mod rest;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

#[cfg(any(test, feature = "mocks"))]
pub use mock::{MockTableClient, RecordedCall};
#[cfg(feature = "rest")]
pub use rest::RestTableClient;

/// Table names used by the portal.
pub mod tables {
    pub const STUDENTS: &str = "students";
    pub const PARENTS: &str = "parents";
    pub const TEACHERS: &str = "teachers";
    pub const FEES: &str = "fees";
    pub const ATTENDANCE: &str = "attendance";
    pub const CLASS_ATTENDANCE: &str = "class_attendance";
    pub const EXAMS: &str = "exams";
    pub const TIMETABLE: &str = "timetable";
    pub const CHAT_MESSAGES: &str = "chat_messages";
    pub const DOCUMENTS: &str = "documents";
    pub const LEAVES: &str = "leaves";
    pub const COMMUNICATIONS: &str = "communications";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const HOMEWORK: &str = "homework";
    pub const MARKS: &str = "marks";
    pub const ACTIVITY_LOGS: &str = "activity_logs";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
    /// Case-insensitive pattern match; `%` is the wildcard.
    Ilike,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Ilike => "ilike",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A read against one table.
///
/// ```rust
/// use campusgate::backend::{FilterOp, TableQuery};
///
/// let query = TableQuery::from("exams")
///     .eq("student_id", "S1")
///     .gte("exam_date", "2026-01-10")
///     .order("exam_date", true)
///     .limit(5);
///
/// assert_eq!(query.filters[1].op, FilterOp::Gte);
/// assert_eq!(query.limit, Some(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub table: String,
    /// Comma-separated column list; `*` for all.
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
    /// Exactly one row is expected; zero rows is a not-found error.
    pub single: bool,
}

impl TableQuery {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_owned(),
            filters: Vec::new(),
            order: None,
            limit: None,
            single: false,
        }
    }

    #[must_use]
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    #[must_use]
    pub fn filter(mut self, column: impl Into<String>, op: FilterOp, value: impl ToString) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            op,
            value: value.to_string(),
        });
        self
    }

    #[must_use]
    pub fn eq(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    #[must_use]
    pub fn gte(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(column, FilterOp::Gte, value)
    }

    #[must_use]
    pub fn lte(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(column, FilterOp::Lte, value)
    }

    /// Case-insensitive substring match on `column`.
    #[must_use]
    pub fn ilike_contains(self, column: impl Into<String>, needle: &str) -> Self {
        self.filter(column, FilterOp::Ilike, format!("%{needle}%"))
    }

    #[must_use]
    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Connection refused, DNS failure, TLS failure.
    Network,
    Timeout,
    /// The store answered with a non-success status.
    Status(u16),
    /// The response body didn't decode.
    Decode,
    /// The request could not be built.
    InvalidRequest,
}

/// A failed remote call. Carries raw detail for diagnostics; never shown to
/// users as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Timeout, message)
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Status(code), message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Decode, message)
    }

    pub fn not_found(table: &str) -> Self {
        Self::status(404, format!("no row found in {table}"))
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RemoteErrorKind::Network => write!(f, "network error: {}", self.message),
            RemoteErrorKind::Timeout => write!(f, "timeout: {}", self.message),
            RemoteErrorKind::Status(code) => write!(f, "status {code}: {}", self.message),
            RemoteErrorKind::Decode => write!(f, "invalid response: {}", self.message),
            RemoteErrorKind::InvalidRequest => write!(f, "invalid request: {}", self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Generic tabular access to the hosted store.
#[async_trait]
pub trait TableClient: Send + Sync {
    async fn select(&self, query: &TableQuery) -> Result<Vec<Value>, RemoteError>;

    /// Number of rows matching the query's filters.
    async fn count(&self, query: &TableQuery) -> Result<u64, RemoteError>;

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, RemoteError>;

    /// Applies `patch` to every row matching the query's filters.
    async fn update(&self, query: &TableQuery, patch: Value) -> Result<Vec<Value>, RemoteError>;
}
