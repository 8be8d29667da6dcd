//! Notification Bridge
//!
//! Holds the single listener connection to the store's change-notification
//! channel and republishes every payload into the [`SubscriptionRegistry`].
//!
//! # Connection State Machine
//!
//! ```text
//!                 start()                 connect ok
//! Disconnected ───────────► Connecting ─────────────► Connected
//!      ▲                        │                         │
//!      │      connect failed    │       receive failed    │
//!      └────────────────────────┴─────────────────────────┘
//!                 (one reconnect scheduled after a fixed delay)
//! ```
//!
//! At most one physical connection and at most one pending reconnect exist
//! at any time. Callers of `start()` that arrive while an attempt is in
//! flight wait for that attempt and share its outcome. `stop()` is terminal: it cancels the reader and any pending
//! reconnect, and later `start()` calls fail with [`BridgeError::Stopped`].
//!
//! [`SubscriptionRegistry`]: crate::application::services::SubscriptionRegistry

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::payload::{PayloadError, parse_notification};
use crate::application::ports::{
    BridgeError, NotificationConnector, NotificationStream, UpstreamSource,
};
use crate::application::services::SharedRegistry;
use crate::infrastructure::metrics::{self, DiscardReason};

// =============================================================================
// State
// =============================================================================

/// Listener connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No connection and none being opened.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Listening for notifications.
    Connected,
}

impl ConnectionState {
    /// Get the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

#[derive(Debug)]
struct BridgeState {
    connection: ConnectionState,
    reconnect_scheduled: bool,
    stopped: bool,
    reader: Option<JoinHandle<()>>,
}

#[derive(Debug, Default)]
struct BridgeCounters {
    notifications_received: AtomicU64,
    notifications_dropped: AtomicU64,
    reconnect_attempts: AtomicU64,
}

/// Point-in-time bridge status for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeStatus {
    /// Connection state.
    pub state: ConnectionState,
    /// Channel being listened on.
    pub channel: String,
    /// Whether a reconnect is pending.
    pub reconnect_scheduled: bool,
    /// Reconnects scheduled since startup.
    pub reconnect_attempts: u64,
    /// Payloads received since startup.
    pub notifications_received: u64,
    /// Payloads discarded since startup.
    pub notifications_dropped: u64,
}

// =============================================================================
// Bridge
// =============================================================================

/// Configuration for the bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Notification channel name.
    pub channel: String,
    /// Delay before each reconnect attempt.
    pub reconnect_delay: Duration,
}

/// Single upstream listener feeding the subscription registry.
pub struct NotificationBridge {
    connector: Arc<dyn NotificationConnector>,
    registry: SharedRegistry,
    config: BridgeConfig,
    state: Mutex<BridgeState>,
    connection: watch::Sender<ConnectionState>,
    counters: BridgeCounters,
    shutdown: CancellationToken,
    me: Weak<Self>,
}

impl NotificationBridge {
    /// Create a stopped-until-started bridge.
    #[must_use]
    pub fn new(
        connector: Arc<dyn NotificationConnector>,
        registry: SharedRegistry,
        config: BridgeConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            connector,
            registry,
            config,
            state: Mutex::new(BridgeState {
                connection: ConnectionState::Disconnected,
                reconnect_scheduled: false,
                stopped: false,
                reader: None,
            }),
            connection: watch::Sender::new(ConnectionState::Disconnected),
            counters: BridgeCounters::default(),
            shutdown: CancellationToken::new(),
            me: me.clone(),
        })
    }

    /// Open the listener connection if there is none.
    ///
    /// A no-op when connected. While another attempt is in flight, waits for
    /// it and reports its outcome. On failure the bridge schedules a
    /// reconnect and returns the error.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Stopped`] after [`NotificationBridge::stop`],
    /// the connector's error, or [`BridgeError::ConnectFailed`] when the
    /// attempt this call waited on failed.
    pub async fn start(&self) -> Result<(), BridgeError> {
        let in_flight = {
            let mut state = self.state.lock();
            if state.stopped {
                return Err(BridgeError::Stopped);
            }
            match state.connection {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Connecting => Some(self.connection.subscribe()),
                ConnectionState::Disconnected => {
                    self.transition(&mut state, ConnectionState::Connecting);
                    None
                }
            }
        };

        match in_flight {
            Some(rx) => self.await_attempt(rx).await,
            None => self.connect().await,
        }
    }

    /// Close the connection and cancel any pending reconnect. Idempotent.
    pub async fn stop(&self) {
        let reader = {
            let mut state = self.state.lock();
            state.stopped = true;
            state.reconnect_scheduled = false;
            self.transition(&mut state, ConnectionState::Disconnected);
            state.reader.take()
        };
        self.shutdown.cancel();

        if let Some(reader) = reader {
            if let Err(e) = reader.await {
                tracing::warn!(error = %e, "Notification reader task failed");
            }
            tracing::info!(channel = %self.config.channel, "Notification bridge stopped");
        }
        metrics::set_upstream_connected(false);
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state.lock().connection
    }

    /// Status snapshot.
    #[must_use]
    pub fn status(&self) -> BridgeStatus {
        let (state, reconnect_scheduled) = {
            let guard = self.state.lock();
            (guard.connection, guard.reconnect_scheduled)
        };
        BridgeStatus {
            state,
            channel: self.config.channel.clone(),
            reconnect_scheduled,
            reconnect_attempts: self.counters.reconnect_attempts.load(Ordering::Relaxed),
            notifications_received: self.counters.notifications_received.load(Ordering::Relaxed),
            notifications_dropped: self.counters.notifications_dropped.load(Ordering::Relaxed),
        }
    }

    fn transition(&self, state: &mut BridgeState, next: ConnectionState) {
        state.connection = next;
        self.connection.send_replace(next);
    }

    /// `rx` must have been subscribed under the state lock while `Connecting`.
    async fn await_attempt(
        &self,
        mut rx: watch::Receiver<ConnectionState>,
    ) -> Result<(), BridgeError> {
        let outcome = *rx
            .wait_for(|state| *state != ConnectionState::Connecting)
            .await
            .map_err(|_| BridgeError::Stopped)?;

        match outcome {
            ConnectionState::Connected => Ok(()),
            _ if self.state.lock().stopped => Err(BridgeError::Stopped),
            _ => Err(BridgeError::ConnectFailed(format!(
                "connection attempt on channel {} failed",
                self.config.channel
            ))),
        }
    }

    /// Caller has already moved the state to `Connecting`.
    async fn connect(&self) -> Result<(), BridgeError> {
        tracing::debug!(channel = %self.config.channel, "Opening listener connection");

        let stream = match self.connector.connect(&self.config.channel).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(channel = %self.config.channel, error = %e, "Listener connection failed");
                self.on_connection_lost();
                return Err(e);
            }
        };

        let Some(bridge) = self.me.upgrade() else {
            stream.close().await;
            return Err(BridgeError::Stopped);
        };

        let rejected = {
            let mut state = self.state.lock();
            if state.stopped {
                Some(stream)
            } else {
                self.transition(&mut state, ConnectionState::Connected);
                let token = self.shutdown.child_token();
                state.reader = Some(tokio::spawn(bridge.read_loop(stream, token)));
                None
            }
        };
        if let Some(stream) = rejected {
            stream.close().await;
            return Err(BridgeError::Stopped);
        }

        metrics::set_upstream_connected(true);
        tracing::info!(channel = %self.config.channel, "Listening for score notifications");
        Ok(())
    }

    async fn read_loop(self: Arc<Self>, mut stream: Box<dyn NotificationStream>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    stream.close().await;
                    return;
                }
                received = stream.recv() => match received {
                    Ok(payload) => self.dispatch(&payload),
                    Err(e) => {
                        tracing::warn!(channel = %self.config.channel, error = %e, "Listener connection lost");
                        self.on_connection_lost();
                        return;
                    }
                }
            }
        }
    }

    fn dispatch(&self, raw: &str) {
        self.counters
            .notifications_received
            .fetch_add(1, Ordering::Relaxed);
        metrics::record_notification_received();

        match parse_notification(raw) {
            Ok(event) => {
                let delivered = self.registry.publish(event.match_id(), &event);
                tracing::trace!(
                    match_id = %event.match_id(),
                    version = event.version(),
                    delivered,
                    "Score update published"
                );
            }
            Err(e) => {
                self.counters
                    .notifications_dropped
                    .fetch_add(1, Ordering::Relaxed);
                metrics::record_notification_discarded(discard_reason(&e));
                tracing::warn!(error = %e, "Discarding notification payload");
            }
        }
    }

    fn on_connection_lost(&self) {
        {
            let mut state = self.state.lock();
            self.transition(&mut state, ConnectionState::Disconnected);
        }
        metrics::set_upstream_connected(false);
        self.schedule_reconnect();
    }

    /// Arrange a single reconnect attempt after the configured delay.
    ///
    /// A no-op when one is already pending or the bridge is stopped.
    fn schedule_reconnect(&self) {
        {
            let mut state = self.state.lock();
            if state.stopped || state.reconnect_scheduled {
                return;
            }
            state.reconnect_scheduled = true;
        }
        let Some(bridge) = self.me.upgrade() else {
            return;
        };

        let attempt = self
            .counters
            .reconnect_attempts
            .fetch_add(1, Ordering::Relaxed)
            + 1;
        metrics::record_reconnect();
        tracing::info!(
            attempt,
            delay_ms = u64::try_from(self.config.reconnect_delay.as_millis()).unwrap_or(u64::MAX),
            "Reconnect scheduled"
        );

        tokio::spawn(async move {
            tokio::select! {
                () = bridge.shutdown.cancelled() => return,
                () = tokio::time::sleep(bridge.config.reconnect_delay) => {}
            }

            {
                let mut state = bridge.state.lock();
                state.reconnect_scheduled = false;
                if state.stopped || state.connection != ConnectionState::Disconnected {
                    return;
                }
                bridge.transition(&mut state, ConnectionState::Connecting);
            }

            if let Err(e) = bridge.connect().await {
                tracing::warn!(attempt, error = %e, "Reconnect failed");
            }
        });
    }
}

#[async_trait]
impl UpstreamSource for NotificationBridge {
    async fn ensure_started(&self) -> Result<(), BridgeError> {
        self.start().await
    }
}

const fn discard_reason(error: &PayloadError) -> DiscardReason {
    match error {
        PayloadError::Json(_) | PayloadError::NotAnObject => DiscardReason::Malformed,
        PayloadError::MissingMatchId => DiscardReason::MissingMatchId,
    }
}

// =============================================================================
// Tests
// =============================================================================
