#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements,
        clippy::cast_possible_truncation
    )
)]

//! Score Stream - Live Match Update Relay
//!
//! Maintains a single PostgreSQL `LISTEN` connection for score change
//! notifications and fans every update out to the viewers watching that
//! match over Server-Sent Events. Also hosts the pure cricket scoring rules
//! used when recording deliveries.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure types and rules
//!   - `scoring`: Score update events and match ids
//!   - `cricket`: Overs notation, rates, innings completion, match result
//!   - `ranking`: Player-of-the-match heuristic
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Notification connector and upstream source interfaces
//!   - `services`: Subscription registry and per-viewer stream sessions
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `notify`: Notification bridge and the Postgres listener adapter
//!   - `sse`: Server-Sent Events HTTP endpoint
//!   - `config`: Environment configuration
//!   - `health`: Health check HTTP endpoint
//!
//! # Data Flow
//!
//! ```text
//!                      ┌──────────────┐     ┌──────────────┐
//! Postgres NOTIFY ───► │ Notification │ ──► │ Subscription │ ──► Session 1 ──► SSE
//!  (score_updates)     │    Bridge    │     │   Registry   │ ──► Session 2 ──► SSE
//!                      └──────────────┘     └──────────────┘ ──► Session N ──► SSE
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Score events and cricket rules with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::scoring::{MatchId, MatchStatus, ScoreUpdateEvent};

// Ports
pub use application::ports::{
    BridgeError, NotificationConnector, NotificationStream, UpstreamSource,
};

// Services
pub use application::services::{
    RegistryError, RegistryStats, SessionConfig, SessionFrame, SharedRegistry, StreamSession,
    Subscription, SubscriptionRegistry,
};

// Infrastructure config
pub use infrastructure::config::{
    ConfigError, DatabaseUrl, NotifySettings, RelayConfig, ServerSettings, SessionSettings,
};

// Notification bridge
pub use infrastructure::notify::{
    BridgeConfig, BridgeStatus, ConnectionState, NotificationBridge, PayloadError,
    PgNotificationConnector, parse_notification,
};

// SSE server
pub use infrastructure::sse::{SseServer, SseServerError, SseState};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
