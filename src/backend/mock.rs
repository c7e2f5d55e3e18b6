use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{Filter, FilterOp, RemoteError, TableClient, TableQuery};

/// One call made against a [`MockTableClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Select(TableQuery),
    Count(TableQuery),
    Insert { table: String, rows: Vec<Value> },
    Update { query: TableQuery, patch: Value },
}

impl RecordedCall {
    pub fn table(&self) -> &str {
        match self {
            Self::Select(query) | Self::Count(query) | Self::Update { query, .. } => &query.table,
            Self::Insert { table, .. } => table,
        }
    }
}

/// In-memory table store that evaluates queries the way the hosted store
/// does, records every call, and can be told to fail.
#[derive(Debug, Default)]
pub struct MockTableClient {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    failures: Mutex<HashMap<String, RemoteError>>,
    fail_all: Mutex<Option<RemoteError>>,
    latency: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTableClient {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.seed(table, rows);
        self
    }

    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        lock(&self.tables)
            .entry(table.to_owned())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        lock(&self.tables).get(table).cloned().unwrap_or_default()
    }

    /// Every call against `table` fails with `error` until cleared.
    pub fn fail_table(&self, table: &str, error: RemoteError) {
        lock(&self.failures).insert(table.to_owned(), error);
    }

    /// Every call fails with `error` until cleared.
    pub fn fail_all(&self, error: RemoteError) {
        *lock(&self.fail_all) = Some(error);
    }

    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
        *lock(&self.fail_all) = None;
    }

    /// Calls against `table` wait `delay` (on the tokio clock) before answering.
    pub fn set_latency(&self, table: &str, delay: Duration) {
        lock(&self.latency).insert(table.to_owned(), delay);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn calls_to(&self, table: &str) -> usize {
        lock(&self.calls).iter().filter(|c| c.table() == table).count()
    }

    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    async fn enter(&self, call: RecordedCall) -> Result<(), RemoteError> {
        let table = call.table().to_owned();
        lock(&self.calls).push(call);

        let delay = lock(&self.latency).get(&table).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = lock(&self.fail_all).clone() {
            return Err(error);
        }
        if let Some(error) = lock(&self.failures).get(&table).cloned() {
            return Err(error);
        }
        Ok(())
    }

    fn matching(&self, query: &TableQuery) -> Vec<Value> {
        lock(&self.tables)
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| matches_filter(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl TableClient for MockTableClient {
    async fn select(&self, query: &TableQuery) -> Result<Vec<Value>, RemoteError> {
        self.enter(RecordedCall::Select(query.clone())).await?;

        let mut rows = self.matching(query);
        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        if query.single {
            rows.truncate(1);
            if rows.is_empty() {
                return Err(RemoteError::not_found(&query.table));
            }
        }

        Ok(rows)
    }

    async fn count(&self, query: &TableQuery) -> Result<u64, RemoteError> {
        self.enter(RecordedCall::Count(query.clone())).await?;
        Ok(self.matching(query).len() as u64)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, RemoteError> {
        self.enter(RecordedCall::Insert {
            table: table.to_owned(),
            rows: rows.clone(),
        })
        .await?;

        self.seed(table, rows.clone());
        Ok(rows)
    }

    async fn update(&self, query: &TableQuery, patch: Value) -> Result<Vec<Value>, RemoteError> {
        self.enter(RecordedCall::Update {
            query: query.clone(),
            patch: patch.clone(),
        })
        .await?;

        let mut tables = lock(&self.tables);
        let Some(rows) = tables.get_mut(&query.table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in rows.iter_mut() {
            if !query.filters.iter().all(|f| matches_filter(row, f)) {
                continue;
            }
            if let (Value::Object(target), Value::Object(changes)) = (&mut *row, &patch) {
                for (key, value) in changes {
                    target.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => as_text(x).cmp(&as_text(y)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    let Some(field) = row.get(&filter.column) else {
        return false;
    };

    let wanted = Value::String(filter.value.clone());
    let numeric = match (field.as_f64(), filter.value.parse::<f64>()) {
        (Some(x), Ok(y)) => x.partial_cmp(&y),
        _ => None,
    };
    let ordering = numeric.unwrap_or_else(|| compare(Some(field), Some(&wanted)));

    match filter.op {
        FilterOp::Eq => ordering == Ordering::Equal,
        FilterOp::Gte => ordering != Ordering::Less,
        FilterOp::Lte => ordering != Ordering::Greater,
        FilterOp::Ilike => {
            let needle = filter.value.trim_matches('%').to_lowercase();
            as_text(field).to_lowercase().contains(&needle)
        }
    }
}
