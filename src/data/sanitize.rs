//! Maps raw failure text to the fixed messages users may see.

pub const NETWORK_MESSAGE: &str = "Network connection error. Please check your internet connection.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";
pub const NOT_FOUND_MESSAGE: &str = "The requested resource was not found.";
pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please try again.";
pub const GENERIC_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

const FIXED_MESSAGES: [&str; 6] = [
    NETWORK_MESSAGE,
    SESSION_EXPIRED_MESSAGE,
    FORBIDDEN_MESSAGE,
    NOT_FOUND_MESSAGE,
    TIMEOUT_MESSAGE,
    GENERIC_MESSAGE,
];

/// Returns the user-facing message for a raw error description.
///
/// Matching is case-insensitive and checked in order: network/connection,
/// unauthorized/401, forbidden/403, not found/404, timeout. Anything else
/// becomes a generic message, so stack traces, SQL and URLs never reach the
/// user. Already-sanitized messages are returned unchanged.
///
/// ```rust
/// use campusgate::data::sanitize_message;
///
/// assert_eq!(
///     sanitize_message("status 401: JWT expired"),
///     "Session expired. Please log in again."
/// );
/// let once = sanitize_message("duplicate key value violates unique constraint");
/// assert_eq!(sanitize_message(&once), once);
/// ```
pub fn sanitize_message(raw: &str) -> String {
    if FIXED_MESSAGES.contains(&raw) {
        return raw.to_owned();
    }

    let lower = raw.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    let message = if has(&["network", "connection"]) {
        NETWORK_MESSAGE
    } else if has(&["unauthorized", "401"]) {
        SESSION_EXPIRED_MESSAGE
    } else if has(&["forbidden", "403"]) {
        FORBIDDEN_MESSAGE
    } else if has(&["not found", "404"]) {
        NOT_FOUND_MESSAGE
    } else if has(&["timeout", "timed out"]) {
        TIMEOUT_MESSAGE
    } else {
        GENERIC_MESSAGE
    };

    message.to_owned()
}
