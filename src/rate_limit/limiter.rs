use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;

use super::limit::Limit;
use super::store::RateLimitStore;
use crate::PortalError;

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Action is allowed. Contains remaining attempts.
    Allowed {
        remaining: u32,
        reset_at: DateTime<Utc>,
    },
    /// Action is throttled.
    Limited { retry_after: i64, message: String },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    pub fn is_limited(&self) -> bool {
        matches!(self, Self::Limited { .. })
    }

    /// Returns the retry-after value in seconds if throttled.
    pub fn retry_after(&self) -> Option<i64> {
        match self {
            Self::Limited { retry_after, .. } => Some(*retry_after),
            Self::Allowed { .. } => None,
        }
    }

    /// Converts a throttled result into [`PortalError::Throttled`].
    pub fn into_result(self) -> Result<(), PortalError> {
        match self {
            Self::Allowed { .. } => Ok(()),
            Self::Limited {
                retry_after,
                message,
            } => Err(PortalError::Throttled {
                retry_after,
                message,
            }),
        }
    }
}

/// Rate limiter with named limit configurations.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use campusgate::rate_limit::{KeyValueRateLimitStore, Limit, RateLimiter};
/// use campusgate::storage::InMemoryStore;
/// use chrono::Duration;
/// use mockable::DefaultClock;
///
/// let store = Arc::new(KeyValueRateLimitStore::new(Arc::new(InMemoryStore::new())));
/// let limiter = RateLimiter::new(store, Arc::new(DefaultClock))
///     .for_("login", Limit::once_per(Duration::seconds(3)).globally())
///     .for_("otp", Limit::once_per(Duration::seconds(30)).by_subject());
/// ```
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
    limits: HashMap<String, Limit>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn RateLimitStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            limits: HashMap::new(),
        }
    }

    /// Registers a named limit.
    #[must_use]
    pub fn for_(mut self, name: impl Into<String>, limit: Limit) -> Self {
        self.limits.insert(name.into(), limit);
        self
    }

    fn limit(&self, name: &str) -> Result<&Limit, PortalError> {
        self.limits.get(name).ok_or_else(|| {
            PortalError::Configuration(format!("Rate limit '{name}' not configured"))
        })
    }

    /// Records a hit against a limit and checks whether it is allowed.
    ///
    /// A throttled hit still counts, so hammering the button doesn't shorten
    /// the wait.
    pub async fn hit(&self, limit_name: &str, key: &str) -> Result<RateLimitResult, PortalError> {
        let limit = self.limit(limit_name)?;
        let now = self.clock.utc();

        let full_key = limit.counter_key(limit_name, key);
        let info = self.store.increment(&full_key, limit.window, now).await?;

        if info.attempts > limit.max_attempts {
            let message = limit
                .get_message()
                .unwrap_or("Too many attempts. Please try again later.")
                .to_owned();

            Ok(RateLimitResult::Limited {
                retry_after: info.available_in(now),
                message,
            })
        } else {
            Ok(RateLimitResult::Allowed {
                remaining: limit.max_attempts - info.attempts,
                reset_at: info.reset_at,
            })
        }
    }

    pub async fn remaining(&self, limit_name: &str, key: &str) -> Result<u32, PortalError> {
        let limit = self.limit(limit_name)?;
        let full_key = limit.counter_key(limit_name, key);
        self.store
            .remaining(&full_key, limit.max_attempts, self.clock.utc())
            .await
    }

    /// Returns seconds until the limit resets for a key.
    pub async fn available_in(&self, limit_name: &str, key: &str) -> Result<i64, PortalError> {
        let limit = self.limit(limit_name)?;
        let full_key = limit.counter_key(limit_name, key);
        let now = self.clock.utc();

        Ok(self
            .store
            .get(&full_key)
            .await?
            .map_or(0, |info| info.available_in(now)))
    }

    /// Clears the counter for a key.
    pub async fn clear(&self, limit_name: &str, key: &str) -> Result<(), PortalError> {
        let limit = self.limit(limit_name)?;
        self.store.reset(&limit.counter_key(limit_name, key)).await
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limits", &self.limits.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
