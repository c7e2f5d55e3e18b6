use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::PortalError;
use crate::storage::{KeyValueStore, keys, read_json, write_json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub attempts: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitInfo {
    /// Whole seconds until the window closes, rounded up.
    pub fn available_in(&self, now: DateTime<Utc>) -> i64 {
        let remaining = (self.reset_at - now).num_milliseconds().max(0);
        (remaining + 999) / 1000
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.reset_at <= now
    }
}

/// Counter storage for [`RateLimiter`](super::RateLimiter).
///
/// Time is passed in by the limiter so stores stay clock-free.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// creates key with 1 attempt if it doesn't exist or its window has closed
    async fn increment(
        &self,
        key: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<RateLimitInfo, PortalError>;

    async fn get(&self, key: &str) -> Result<Option<RateLimitInfo>, PortalError>;

    async fn reset(&self, key: &str) -> Result<(), PortalError>;

    /// does not increment the counter
    async fn remaining(
        &self,
        key: &str,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> Result<u32, PortalError> {
        Ok(self.get(key).await?.map_or(max_attempts, |info| {
            if info.is_expired_at(now) {
                max_attempts
            } else {
                max_attempts.saturating_sub(info.attempts)
            }
        }))
    }
}

/// Keeps counters as JSON under `rate_limit:<key>` in a [`KeyValueStore`],
/// normally the durable browser scope.
#[derive(Clone)]
pub struct KeyValueRateLimitStore {
    store: Arc<dyn KeyValueStore>,
}

impl KeyValueRateLimitStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn storage_key(key: &str) -> String {
        format!("{}{key}", keys::RATE_LIMIT_PREFIX)
    }
}

#[async_trait]
impl RateLimitStore for KeyValueRateLimitStore {
    async fn increment(
        &self,
        key: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<RateLimitInfo, PortalError> {
        let current = self.get(key).await?;

        let info = match current {
            Some(info) if !info.is_expired_at(now) => RateLimitInfo {
                attempts: info.attempts.saturating_add(1),
                reset_at: info.reset_at,
            },
            _ => RateLimitInfo {
                attempts: 1,
                reset_at: now + window,
            },
        };

        write_json(self.store.as_ref(), &Self::storage_key(key), &info)?;
        Ok(info)
    }

    async fn get(&self, key: &str) -> Result<Option<RateLimitInfo>, PortalError> {
        match read_json(self.store.as_ref(), &Self::storage_key(key)) {
            Ok(info) => Ok(info),
            // a corrupted counter only ever loosens the limit
            Err(PortalError::SerializationError(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn reset(&self, key: &str) -> Result<(), PortalError> {
        self.store.remove(&Self::storage_key(key))
    }
}
