use async_trait::async_trait;

use super::{Listener, PortalEvent};
use crate::data::ErrorInfo;

/// Listeners registered at application start.
///
/// Construct one registry, wrap it in an `Arc`, and hand it to every service.
/// An empty registry makes dispatch a no-op.
#[derive(Default)]
pub struct EventRegistry {
    listeners: Vec<Box<dyn Listener>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener to receive events.
    ///
    /// Listeners are called in the order they are registered.
    pub fn listen(&mut self, listener: impl Listener) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Register a callback for failed write operations only.
    ///
    /// The callback receives the sanitized error, never the underlying
    /// transport failure.
    pub fn on_error<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&ErrorInfo) + Send + Sync + 'static,
    {
        self.listen(ErrorCallback(callback))
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Dispatch an event to all registered listeners.
    pub async fn dispatch(&self, event: PortalEvent) {
        for listener in &self.listeners {
            listener.handle(&event).await;
        }
    }
}

struct ErrorCallback<F>(F);

#[async_trait]
impl<F> Listener for ErrorCallback<F>
where
    F: Fn(&ErrorInfo) + Send + Sync + 'static,
{
    async fn handle(&self, event: &PortalEvent) {
        if let PortalEvent::OperationFailed { error } = event {
            (self.0)(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use super::*;

    struct Counter(Arc<AtomicUsize>);

    #[async_trait]
    impl Listener for Counter {
        async fn handle(&self, _event: &PortalEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_dispatch_reaches_every_listener() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut registry = EventRegistry::new();
        registry
            .listen(Counter(Arc::clone(&count)))
            .listen(Counter(Arc::clone(&count)));

        registry
            .dispatch(PortalEvent::SessionCleared { at: Utc::now() })
            .await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_registry_is_noop() {
        let registry = EventRegistry::new();
        assert!(registry.is_empty());

        registry
            .dispatch(PortalEvent::SessionCleared { at: Utc::now() })
            .await;
    }

    #[tokio::test]
    async fn test_on_error_only_sees_failures() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut registry = EventRegistry::new();
        registry.on_error(move |error| sink.lock().unwrap().push(error.title.clone()));

        registry
            .dispatch(PortalEvent::SessionCleared { at: Utc::now() })
            .await;
        registry
            .dispatch(PortalEvent::OperationFailed {
                error: ErrorInfo::new("Sending message", "Request timed out. Please try again."),
            })
            .await;

        assert_eq!(*seen.lock().unwrap(), vec!["Error: Sending message".to_owned()]);
    }
}
