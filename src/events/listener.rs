use async_trait::async_trait;

use super::PortalEvent;

/// Receives every event dispatched through an
/// [`EventRegistry`](super::EventRegistry).
///
/// Filter by matching on the event variant. Listeners run in registration
/// order and must not panic; a slow listener delays the operation that
/// dispatched the event.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &PortalEvent);
}
