//! Event system for session, login and data-layer activity.
//!
//! Services dispatch [`PortalEvent`]s to an [`EventRegistry`] that is built
//! once at start-up and shared by reference. UI collaborators subscribe here
//! instead of being looked up at call time: a toast layer listens for
//! [`PortalEvent::OperationFailed`] and [`PortalEvent::AccessDenied`], a
//! diagnostics panel for [`PortalEvent::DataDegraded`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use campusgate::events::{EventRegistry, listeners::LoggingListener};
//!
//! let mut registry = EventRegistry::new();
//! registry
//!     .listen(LoggingListener::new())
//!     .on_error(|error| eprintln!("{}: {}", error.title, error.message));
//! let events = Arc::new(registry);
//! ```
//!
//! # Custom Listeners
//!
//! ```rust,ignore
//! use campusgate::events::{Listener, PortalEvent};
//! use async_trait::async_trait;
//!
//! struct BadgeListener;
//!
//! #[async_trait]
//! impl Listener for BadgeListener {
//!     async fn handle(&self, event: &PortalEvent) {
//!         if let PortalEvent::NotificationsReceived { unread, .. } = event {
//!             // update the bell badge
//!         }
//!     }
//! }
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::PortalEvent;
pub use listener::Listener;
pub use registry::EventRegistry;
