//! Port Interfaces
//!
//! Defines the interfaces (ports) between the fan-out core and the backing
//! store, following the Hexagonal Architecture pattern.
//!
//! ## Driven Ports (Outbound)
//!
//! - `NotificationConnector` / `NotificationStream`: a dedicated listener
//!   connection on the store's change-notification channel
//!
//! ## Driver Ports (Inbound)
//!
//! - `UpstreamSource`: lets the subscription registry lazily start the
//!   notification bridge on first subscribe

use async_trait::async_trait;

/// Notification bridge and listener connection errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Could not open the listener connection.
    #[error("failed to connect to notification source: {0}")]
    ConnectFailed(String),

    /// Connected, but subscribing to the channel failed.
    #[error("failed to listen on channel {channel}: {reason}")]
    ListenFailed {
        /// Channel name.
        channel: String,
        /// Underlying error text.
        reason: String,
    },

    /// The connection dropped while waiting for notifications.
    #[error("notification connection lost: {0}")]
    ConnectionLost(String),

    /// The bridge was stopped and will not reconnect.
    #[error("notification bridge stopped")]
    Stopped,
}

/// One live listener connection.
///
/// Owned exclusively by the notification bridge's reader task.
#[async_trait]
pub trait NotificationStream: Send {
    /// Wait for the next notification payload.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ConnectionLost`] when the connection drops.
    async fn recv(&mut self) -> Result<String, BridgeError>;

    /// Unsubscribe from the channel and close the connection.
    async fn close(self: Box<Self>);
}

/// Factory for listener connections.
#[async_trait]
pub trait NotificationConnector: Send + Sync {
    /// Open a dedicated connection and subscribe it to `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ConnectFailed`] or [`BridgeError::ListenFailed`].
    async fn connect(&self, channel: &str) -> Result<Box<dyn NotificationStream>, BridgeError>;
}

/// Something the registry can ask to start delivering events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Ensure notifications are flowing; a no-op when already connected.
    ///
    /// # Errors
    ///
    /// Returns the connection error when the source cannot be started.
    async fn ensure_started(&self) -> Result<(), BridgeError>;
}
