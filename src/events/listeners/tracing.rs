use async_trait::async_trait;

use crate::events::{Listener, PortalEvent};

/// Emits portal events as tracing events.
///
/// Requires the `tracing` feature to be enabled.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &PortalEvent) {
        if event.is_user_visible() {
            tracing::warn!(
                target: "campusgate::events",
                event_name = event.name(),
                ?event,
                "portal event"
            );
        } else {
            tracing::info!(
                target: "campusgate::events",
                event_name = event.name(),
                ?event,
                "portal event"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[tokio::test]
    async fn test_tracing_listener_handle() {
        let listener = TracingListener;
        let event = PortalEvent::SessionCleared { at: Utc::now() };

        // should not panic
        listener.handle(&event).await;
    }
}
