//! Stream Session
//!
//! One viewer's outbound stream. A single writer task owns the outbound
//! frame channel and multiplexes three sources onto it:
//!
//! - score updates from the viewer's [`Subscription`]
//! - a keep-alive tick
//! - client disconnect or process shutdown
//!
//! The task unsubscribes exactly once on the way out, whatever ended it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::registry::{SharedRegistry, Subscription};
use crate::domain::scoring::{MatchId, ScoreUpdateEvent};
use crate::infrastructure::metrics;

/// Message sent to the viewer when the subscription cannot be set up.
pub const SUBSCRIBE_FAILED_MESSAGE: &str = "Failed to subscribe to live updates";

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between keep-alive frames.
    pub keep_alive_interval: Duration,
    /// Frames buffered between the writer task and the transport.
    pub outbound_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keep_alive_interval: Duration::from_secs(25),
            outbound_buffer: 16,
        }
    }
}

/// A frame produced by the session, before wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionFrame {
    /// Score update for the viewer's match.
    Event(ScoreUpdateEvent),
    /// Heartbeat.
    KeepAlive,
    /// Terminal error; the stream ends after this frame.
    Error(String),
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The viewer went away.
    ClientGone,
    /// Process shutdown.
    Shutdown,
    /// The subscription was closed from the registry side.
    SubscriptionClosed,
    /// Subscribing failed; an error frame was sent.
    SubscribeFailed,
}

impl CloseReason {
    /// Label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientGone => "client_gone",
            Self::Shutdown => "shutdown",
            Self::SubscriptionClosed => "subscription_closed",
            Self::SubscribeFailed => "subscribe_failed",
        }
    }
}

/// One viewer's stream of frames for a single match.
pub struct StreamSession {
    id: Uuid,
    registry: SharedRegistry,
    match_id: MatchId,
    config: SessionConfig,
    shutdown: CancellationToken,
    tx: mpsc::Sender<SessionFrame>,
    last_version: Option<i64>,
}

impl StreamSession {
    /// Start a session and return the receiving end of its frame channel.
    ///
    /// Dropping the receiver ends the session.
    #[must_use]
    pub fn spawn(
        registry: SharedRegistry,
        match_id: MatchId,
        config: SessionConfig,
        shutdown: CancellationToken,
    ) -> mpsc::Receiver<SessionFrame> {
        let (tx, rx) = mpsc::channel(config.outbound_buffer.max(1));
        let session = Self {
            id: Uuid::new_v4(),
            registry,
            match_id,
            config,
            shutdown,
            tx,
            last_version: None,
        };
        tokio::spawn(session.run());
        rx
    }

    /// Drive the session to completion.
    pub async fn run(mut self) -> CloseReason {
        metrics::session_opened();
        tracing::info!(session_id = %self.id, match_id = %self.match_id, "Stream session opened");

        let reason = match self.registry.subscribe(self.match_id.clone()).await {
            Ok(mut subscription) => {
                let reason = self.pump(&mut subscription).await;
                subscription.unsubscribe();
                reason
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.id,
                    match_id = %self.match_id,
                    error = %e,
                    "Subscribe failed"
                );
                if self
                    .deliver(SessionFrame::Error(SUBSCRIBE_FAILED_MESSAGE.to_string()))
                    .await
                {
                    metrics::record_frame_sent(metrics::FrameKind::Error);
                }
                CloseReason::SubscribeFailed
            }
        };

        metrics::session_closed();
        tracing::info!(
            session_id = %self.id,
            match_id = %self.match_id,
            reason = reason.as_str(),
            "Stream session closed"
        );
        reason
    }

    async fn pump(&mut self, subscription: &mut Subscription) -> CloseReason {
        let period = self.config.keep_alive_interval;
        let mut keep_alive = tokio::time::interval_at(Instant::now() + period, period);
        keep_alive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => return CloseReason::Shutdown,
                () = self.tx.closed() => return CloseReason::ClientGone,
                _ = keep_alive.tick() => {
                    if !self.deliver(SessionFrame::KeepAlive).await {
                        return self.closing_reason();
                    }
                    metrics::record_frame_sent(metrics::FrameKind::KeepAlive);
                }
                event = subscription.recv() => {
                    let Some(event) = event else {
                        return CloseReason::SubscriptionClosed;
                    };
                    if self.is_stale(&event) {
                        continue;
                    }
                    if !self.deliver(SessionFrame::Event(event)).await {
                        return self.closing_reason();
                    }
                    metrics::record_frame_sent(metrics::FrameKind::Data);
                }
            }
        }
    }

    /// Drops updates older than the last one delivered. Updates without a
    /// version are always passed through.
    fn is_stale(&mut self, event: &ScoreUpdateEvent) -> bool {
        let Some(version) = event.version() else {
            return false;
        };
        match self.last_version {
            Some(last) if version < last => {
                tracing::debug!(
                    session_id = %self.id,
                    version,
                    last_version = last,
                    "Dropping stale update"
                );
                true
            }
            _ => {
                self.last_version = Some(version);
                false
            }
        }
    }

    /// Push a frame; `false` once the session is closing.
    async fn deliver(&self, frame: SessionFrame) -> bool {
        tokio::select! {
            result = self.tx.send(frame) => result.is_ok(),
            () = self.shutdown.cancelled() => false,
        }
    }

    fn closing_reason(&self) -> CloseReason {
        if self.shutdown.is_cancelled() {
            CloseReason::Shutdown
        } else {
            CloseReason::ClientGone
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
