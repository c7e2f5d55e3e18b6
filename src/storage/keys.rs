//! Storage keys shared by the portal services.

/// Tab scope: serialized [`Session`](crate::Session).
pub const SESSION: &str = "userSession";

/// Tab scope: `"true"` while a session is active.
pub const AUTHENTICATED: &str = "isAuthenticated";

/// Tab scope: most-recently-used search selections.
pub const RECENT_SEARCHES: &str = "recentSearches";

/// Durable: `"true"` when the user ticked "remember me".
pub const REMEMBER_ME: &str = "rememberMe";

/// Durable: cached notification list.
pub const NOTIFICATIONS: &str = "notifications";

/// Durable: prefix for throttle windows, followed by `{limit}:{key}`.
pub const RATE_LIMIT_PREFIX: &str = "rate_limit:";
