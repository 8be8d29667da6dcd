//! Prometheus Metrics Module
//!
//! Exposes relay metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Notifications**: Payloads received from the store and ones discarded
//! - **Fan-out**: Events queued for subscribers and events lost to lag
//! - **Sessions**: Open viewer streams and frames written
//! - **Upstream**: Listener connection state and reconnects
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "score_stream_notifications_received_total",
        "Notification payloads received from the store"
    );
    describe_counter!(
        "score_stream_notifications_discarded_total",
        "Notification payloads discarded by reason"
    );
    describe_counter!(
        "score_stream_events_published_total",
        "Events queued for subscribers"
    );
    describe_counter!(
        "score_stream_events_lagged_total",
        "Events overwritten in a slow subscriber's queue"
    );
    describe_counter!(
        "score_stream_frames_sent_total",
        "Frames written to viewer streams by kind"
    );
    describe_counter!(
        "score_stream_reconnects_total",
        "Listener reconnection attempts"
    );

    describe_gauge!(
        "score_stream_subscriptions",
        "Active subscriptions across all matches"
    );
    describe_gauge!("score_stream_sessions", "Open viewer streams");
    describe_gauge!(
        "score_stream_upstream_connected",
        "1 when the listener connection is up"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Why a notification payload was not published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Not valid JSON.
    Malformed,
    /// JSON, but no usable match id.
    MissingMatchId,
}

impl DiscardReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::MissingMatchId => "missing_match_id",
        }
    }
}

/// Kind of frame written to a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Score update.
    Data,
    /// Heartbeat comment.
    KeepAlive,
    /// Terminal error event.
    Error,
}

impl FrameKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::KeepAlive => "keep_alive",
            Self::Error => "error",
        }
    }
}

/// Record a payload received from the store.
pub fn record_notification_received() {
    counter!("score_stream_notifications_received_total").increment(1);
}

/// Record a payload that was dropped instead of published.
pub fn record_notification_discarded(reason: DiscardReason) {
    counter!(
        "score_stream_notifications_discarded_total",
        "reason" => reason.as_str()
    )
    .increment(1);
}

/// Record how many subscribers an event was queued for.
pub fn record_event_published(delivered: u64) {
    counter!("score_stream_events_published_total").increment(delivered);
}

/// Record events lost to a lagging subscriber.
pub fn record_events_lagged(count: u64) {
    counter!("score_stream_events_lagged_total").increment(count);
}

/// Record a frame written to a viewer.
pub fn record_frame_sent(kind: FrameKind) {
    counter!("score_stream_frames_sent_total", "kind" => kind.as_str()).increment(1);
}

/// Record a listener reconnection attempt.
pub fn record_reconnect() {
    counter!("score_stream_reconnects_total").increment(1);
}

/// Update the active subscription count.
#[allow(clippy::cast_precision_loss)]
pub fn set_active_subscriptions(count: usize) {
    gauge!("score_stream_subscriptions").set(count as f64);
}

/// A viewer stream opened.
pub fn session_opened() {
    gauge!("score_stream_sessions").increment(1.0);
}

/// A viewer stream closed.
pub fn session_closed() {
    gauge!("score_stream_sessions").decrement(1.0);
}

/// Update the listener connection state.
pub fn set_upstream_connected(connected: bool) {
    gauge!("score_stream_upstream_connected").set(if connected { 1.0 } else { 0.0 });
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_values() {
        assert_eq!(DiscardReason::Malformed.as_str(), "malformed");
        assert_eq!(DiscardReason::MissingMatchId.as_str(), "missing_match_id");
        assert_eq!(FrameKind::Data.as_str(), "data");
        assert_eq!(FrameKind::KeepAlive.as_str(), "keep_alive");
        assert_eq!(FrameKind::Error.as_str(), "error");
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        record_notification_received();
        record_notification_discarded(DiscardReason::Malformed);
        record_event_published(3);
        set_active_subscriptions(2);
        session_opened();
        session_closed();
        set_upstream_connected(true);
    }
}
