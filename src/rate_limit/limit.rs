use chrono::Duration;

/// How hits are grouped into counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// One counter for the whole browser; the caller's key is ignored.
    Global,
    /// One counter per caller-supplied subject (a phone number, an email).
    Subject,
}

#[derive(Debug, Clone)]
pub struct Limit {
    pub(crate) max_attempts: u32,
    pub(crate) window: Duration,
    pub(crate) key_strategy: KeyStrategy,
    pub(crate) message: Option<String>,
}

impl Limit {
    #[must_use]
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            key_strategy: KeyStrategy::Subject,
            message: None,
        }
    }

    /// A single attempt per `window`.
    #[must_use]
    pub fn once_per(window: Duration) -> Self {
        Self::new(1, window)
    }

    #[must_use]
    pub fn by_subject(mut self) -> Self {
        self.key_strategy = KeyStrategy::Subject;
        self
    }

    #[must_use]
    pub fn globally(mut self) -> Self {
        self.key_strategy = KeyStrategy::Global;
        self
    }

    #[must_use]
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        self.key_strategy
    }

    pub fn get_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub(crate) fn counter_key(&self, name: &str, subject: &str) -> String {
        match self.key_strategy {
            KeyStrategy::Global => format!("{name}:global"),
            KeyStrategy::Subject => format!("{name}:{subject}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_once_per() {
        let limit = Limit::once_per(Duration::seconds(30));
        assert_eq!(limit.max_attempts(), 1);
        assert_eq!(limit.window(), Duration::seconds(30));
        assert_eq!(limit.key_strategy(), KeyStrategy::Subject);
    }

    #[test]
    fn test_limit_builder() {
        let limit = Limit::new(5, Duration::minutes(1))
            .globally()
            .message("Please wait before trying again");

        assert_eq!(limit.max_attempts, 5);
        assert_eq!(limit.key_strategy, KeyStrategy::Global);
        assert_eq!(limit.get_message(), Some("Please wait before trying again"));
    }

    #[test]
    fn test_counter_key() {
        let global = Limit::once_per(Duration::seconds(3)).globally();
        assert_eq!(global.counter_key("login", "9876543210"), "login:global");

        let per_phone = Limit::once_per(Duration::seconds(30)).by_subject();
        assert_eq!(per_phone.counter_key("otp", "9876543210"), "otp:9876543210");
    }
}
