//! Score Stream Binary
//!
//! Starts the live score relay.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin score-stream
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL`: Postgres connection string for the listener connection
//!
//! ## Optional
//! - `SCORE_STREAM_CHANNEL`: Notification channel (default: `score_updates`)
//! - `SCORE_STREAM_HTTP_PORT`: SSE port (default: 8080)
//! - `SCORE_STREAM_HEALTH_PORT`: Health and metrics port (default: 8082)
//! - `SCORE_STREAM_RECONNECT_DELAY_MS`: Listener reconnect delay (default: 5000)
//! - `SCORE_STREAM_KEEP_ALIVE_SECS`: SSE keep-alive interval (default: 25)
//! - `SCORE_STREAM_QUEUE_CAPACITY`: Per-viewer event queue depth (default: 64)
//! - `SCORE_STREAM_OUTBOUND_BUFFER`: Per-viewer encoded frame buffer (default: 16)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: score-stream)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use score_stream::infrastructure::health::{HealthServer, HealthServerState};
use score_stream::infrastructure::sse::{SseServer, SseState};
use score_stream::infrastructure::telemetry;
use score_stream::{
    BridgeConfig, NotificationBridge, NotificationConnector, PgNotificationConnector,
    RelayConfig, SessionConfig, SubscriptionRegistry, UpstreamSource, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting score stream relay");

    let _metrics_handle = init_metrics();

    let config = RelayConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let registry = Arc::new(SubscriptionRegistry::new(config.session.queue_capacity));

    let connector: Arc<dyn NotificationConnector> =
        Arc::new(PgNotificationConnector::new(config.database_url.clone()));
    let bridge = NotificationBridge::new(
        connector,
        Arc::clone(&registry),
        BridgeConfig {
            channel: config.notify.channel.clone(),
            reconnect_delay: config.notify.reconnect_delay,
        },
    );
    let upstream: Arc<dyn UpstreamSource> = Arc::clone(&bridge) as _;
    registry.attach_upstream(&upstream);

    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&bridge),
        Arc::clone(&registry),
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        health_state,
        shutdown_token.clone(),
    );

    let sse_state = SseState::new(
        Arc::clone(&registry),
        SessionConfig::from(&config.session),
        shutdown_token.clone(),
    );
    let sse_server = SseServer::new(config.server.http_port, sse_state, shutdown_token.clone());

    let health_handle = tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    let sse_handle = tokio::spawn(async move {
        if let Err(e) = sse_server.run().await {
            tracing::error!(error = %e, "Score stream server error");
        }
    });

    tracing::info!("Score stream relay ready");

    await_shutdown(shutdown_token).await;

    bridge.stop().await;

    let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        let _ = tokio::join!(health_handle, sse_handle);
    })
    .await;
    if drained.is_err() {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Servers did not stop in time"
        );
    }

    tracing::info!("Score stream relay stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &RelayConfig) {
    tracing::info!(
        channel = %config.notify.channel,
        http_port = config.server.http_port,
        health_port = config.server.health_port,
        "Configuration loaded"
    );
    tracing::debug!(
        reconnect_delay_ms = u64::try_from(config.notify.reconnect_delay.as_millis()).unwrap_or(u64::MAX),
        keep_alive_secs = config.session.keep_alive_interval.as_secs(),
        queue_capacity = config.session.queue_capacity,
        outbound_buffer = config.session.outbound_buffer,
        "Session settings"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
