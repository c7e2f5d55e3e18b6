//! Configuration types for the portal services.
//!
//! [`PortalConfig`] groups the timing knobs of every service; [`BackendConfig`]
//! describes how to reach the hosted table store. Both have production
//! defaults, so most applications only fill in the backend URL and key.
//!
//! # Example
//!
//! ```rust
//! use campusgate::config::{BackendConfig, PortalConfig, SessionConfig};
//! use chrono::Duration;
//!
//! let config = PortalConfig {
//!     session: SessionConfig {
//!         lifetime: Duration::hours(8),
//!     },
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//!
//! // Placeholder credentials put the data layer in demo mode.
//! assert!(!BackendConfig::default().is_valid());
//! ```

use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::Deserialize;

use crate::SecretString;

const PLACEHOLDER_URL: &str = "https://YOUR_PROJECT_ID.supabase.co";
const PLACEHOLDER_KEY: &str = "YOUR_ANON_KEY_HERE";

/// Timing configuration for all portal services.
#[derive(Debug, Clone, Default)]
pub struct PortalConfig {
    pub session: SessionConfig,
    pub polling: PollingConfig,
    pub search: SearchConfig,
    pub throttle: ThrottleConfig,
}

impl PortalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short timings for local development and demos.
    pub fn development() -> Self {
        Self {
            session: SessionConfig {
                lifetime: Duration::hours(24),
            },
            polling: PollingConfig {
                interval: StdDuration::from_secs(5),
                fetch_limit: 20,
                max_kept: 100,
            },
            search: SearchConfig::default(),
            throttle: ThrottleConfig {
                login_interval: Duration::seconds(1),
                otp_resend_interval: Duration::seconds(5),
            },
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.session.lifetime <= Duration::zero() {
            return Err("session lifetime must be positive");
        }
        if self.polling.interval.is_zero() {
            return Err("polling interval must be positive");
        }
        if self.polling.max_kept < self.polling.fetch_limit {
            return Err("notification max_kept must be at least fetch_limit");
        }
        if self.search.recent_capacity == 0 {
            return Err("recent search capacity must be at least 1");
        }
        Ok(())
    }
}

/// Session lifetime settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a session stays valid after login.
    ///
    /// Default: 24 hours
    pub lifetime: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime: Duration::hours(24),
        }
    }
}

/// Notification polling settings.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Time between polls while the tab is visible.
    ///
    /// Default: 30 seconds
    pub interval: StdDuration,

    /// Maximum notifications requested per fetch.
    ///
    /// Default: 20
    pub fetch_limit: usize,

    /// Most notifications kept in the list and its cache; the oldest are
    /// dropped first.
    ///
    /// Default: 100
    pub max_kept: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: StdDuration::from_secs(30),
            fetch_limit: 20,
            max_kept: 100,
        }
    }
}

/// Global search settings.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a search is issued.
    ///
    /// Default: 300 milliseconds
    pub debounce: StdDuration,

    /// Queries shorter than this show the recent list instead.
    ///
    /// Default: 2
    pub min_query_len: usize,

    /// Size of the most-recently-used selection list.
    ///
    /// Default: 5
    pub recent_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: StdDuration::from_millis(300),
            min_query_len: 2,
            recent_capacity: 5,
        }
    }
}

/// Client-side throttling of login attempts and OTP sends.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Minimum time between two login attempts.
    ///
    /// Default: 3 seconds
    pub login_interval: Duration,

    /// Minimum time between two OTP sends to the same phone number.
    ///
    /// Default: 30 seconds
    pub otp_resend_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            login_interval: Duration::seconds(3),
            otp_resend_interval: Duration::seconds(30),
        }
    }
}

/// Location and access key of the hosted table store.
///
/// The defaults are the placeholders shipped with a fresh checkout;
/// [`is_valid`](Self::is_valid) reports `false` for them and the data layer
/// serves mock payloads instead of failing.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: SecretString,

    /// Per-request timeout for the REST adapter.
    #[serde(default = "default_timeout")]
    pub timeout: StdDuration,
}

fn default_timeout() -> StdDuration {
    StdDuration::from_secs(10)
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: PLACEHOLDER_URL.to_owned(),
            anon_key: SecretString::new(PLACEHOLDER_KEY),
            timeout: default_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<SecretString>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            ..Default::default()
        }
    }

    /// True when both the URL and the key have been filled in.
    pub fn is_valid(&self) -> bool {
        let url = self.url.trim();
        let key = self.anon_key.expose_secret();

        let placeholder_url = url.is_empty() || url.contains("YOUR_PROJECT_ID");
        let placeholder_key = self.anon_key.is_empty() || key.contains("YOUR_ANON_KEY");

        !placeholder_url && !placeholder_key
    }
}
