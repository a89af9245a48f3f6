//! Notification delivery with pluggable channels.
//!
//! Alert events are handed to a [`NotificationChannel`] together with a
//! [`NotificationContext`] describing the whole cluster at dispatch time.
//! [`dispatcher::Dispatcher`] fans one event out to several channels,
//! filtered by minimum severity. Built-in channels are `log` and `webhook`.

pub mod channels;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod plugin;
pub mod utils;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use climon_common::types::{AlertEvent, Severity};
pub use context::NotificationContext;
pub use error::{NotifyError, Result};

/// A notification delivery channel that sends alert events to an external
/// service (e.g., a webhook receiver or the process log).
///
/// Implementations are created by the corresponding [`plugin::ChannelPlugin`]
/// and registered in a [`dispatcher::Dispatcher`].
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Delivers the alert event through this channel.
    ///
    /// `context` carries a snapshot of every tracked sensor, including recent
    /// temperature history, so the channel can render supporting material.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails after retries (if applicable).
    async fn send(&self, alert: &AlertEvent, context: &NotificationContext) -> Result<()>;

    /// Whether an alert of `severity` would be delivered anywhere. Callers
    /// skip [`send`](Self::send) when this is `false`.
    fn accepts(&self, _severity: Severity) -> bool {
        true
    }

    /// Returns the channel type name (e.g., `"log"`, `"webhook"`).
    fn channel_name(&self) -> &str;
}
