//! Notification bell: cached list, read state, category filter and a
//! visibility-aware poller.
//!
//! ```rust,ignore
//! let center = Arc::new(NotificationCenter::new(data, &storage, events, clock, &config.polling));
//! center.load().await?;
//!
//! let poller = NotificationPoller::start(Arc::clone(&center), config.polling.interval);
//! // from the page's visibilitychange handler
//! poller.set_visibility(Visibility::Hidden);
//! ```

mod center;
mod format;
mod poller;

pub use center::{NewNotification, NotificationCenter};
pub use format::{badge_text, time_ago};
pub use poller::{NotificationPoller, Visibility};
