//! Client-side throttling of repeated actions.
//!
//! A [`RateLimiter`] holds named [`Limit`]s and counts hits in a
//! [`RateLimitStore`]. The portal registers two limits: one login attempt per
//! window for the whole browser, and one OTP send per window per phone number.
//! Counters live in durable storage so that reloading the page doesn't reset
//! them.

mod limit;
mod limiter;
mod store;

use std::sync::Arc;

use mockable::Clock;

use crate::config::ThrottleConfig;
use crate::storage::BrowserStorage;

pub use limit::{KeyStrategy, Limit};
pub use limiter::{RateLimitResult, RateLimiter};
pub use store::{KeyValueRateLimitStore, RateLimitInfo, RateLimitStore};

/// Name of the login-attempt limit.
pub const LOGIN: &str = "login";

/// Name of the per-phone OTP resend limit.
pub const OTP: &str = "otp";

/// The portal's limiter: [`LOGIN`] once per `login_interval` for the whole
/// browser and [`OTP`] once per `otp_resend_interval` per phone, counted in
/// durable storage.
pub fn portal_limiter(
    storage: &BrowserStorage,
    clock: Arc<dyn Clock>,
    config: &ThrottleConfig,
) -> RateLimiter {
    let store = Arc::new(KeyValueRateLimitStore::new(Arc::clone(&storage.durable)));
    let otp_seconds = config.otp_resend_interval.num_seconds();

    RateLimiter::new(store, clock)
        .for_(
            LOGIN,
            Limit::once_per(config.login_interval)
                .globally()
                .message("Please wait a moment before trying again"),
        )
        .for_(
            OTP,
            Limit::once_per(config.otp_resend_interval)
                .by_subject()
                .message(format!("Please wait {otp_seconds} seconds before resending OTP")),
        )
}
