//! Score Stream HTTP Server
//!
//! Serves live score updates to viewers as Server-Sent Events.
//!
//! # Endpoints
//!
//! - `GET /api/stream?matchId=<id>` - Stream updates for one match
//! - `GET /api/matches/{matchId}/stream` - Same, with the id in the path
//!
//! A missing or blank match id is rejected with `400` and a JSON
//! `{"error": ...}` body before any stream or subscription is created.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::frame;
use crate::application::services::{SessionConfig, SharedRegistry, StreamSession};
use crate::domain::scoring::MatchId;

const MISSING_MATCH_ID: &str = "matchId is required";

// =============================================================================
// State
// =============================================================================

/// Shared state for the SSE routes.
#[derive(Clone)]
pub struct SseState {
    registry: SharedRegistry,
    session: SessionConfig,
    shutdown: CancellationToken,
}

impl SseState {
    /// Create the route state.
    #[must_use]
    pub const fn new(
        registry: SharedRegistry,
        session: SessionConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            session,
            shutdown,
        }
    }
}

/// Build the SSE router.
pub fn router(state: SseState) -> Router {
    Router::new()
        .route("/api/stream", get(stream_by_query))
        .route("/api/matches/{match_id}/stream", get(stream_by_path))
        .with_state(state)
}

// =============================================================================
// Server
// =============================================================================

/// SSE HTTP server.
pub struct SseServer {
    port: u16,
    state: SseState,
    cancel: CancellationToken,
}

impl SseServer {
    /// Create a new SSE server.
    #[must_use]
    pub const fn new(port: u16, state: SseState, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run until cancelled.
    ///
    /// Open sessions observe the same cancellation and end their streams, so
    /// graceful shutdown does not wait on idle viewers.
    ///
    /// # Errors
    ///
    /// Returns `SseServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), SseServerError> {
        let app = router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| SseServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "Score stream server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| SseServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Score stream server stopped");
        Ok(())
    }
}

// =============================================================================
// HTTP Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct StreamQuery {
    #[serde(rename = "matchId")]
    match_id: Option<String>,
}

async fn stream_by_query(
    State(state): State<SseState>,
    Query(query): Query<StreamQuery>,
) -> Response {
    open_stream(&state, query.match_id.as_deref())
}

async fn stream_by_path(State(state): State<SseState>, Path(match_id): Path<String>) -> Response {
    open_stream(&state, Some(&match_id))
}

fn open_stream(state: &SseState, raw_match_id: Option<&str>) -> Response {
    let Some(match_id) = raw_match_id.and_then(MatchId::parse) else {
        tracing::debug!("Rejected stream request without matchId");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": MISSING_MATCH_ID })),
        )
            .into_response();
    };

    let frames = StreamSession::spawn(
        state.registry.clone(),
        match_id,
        state.session.clone(),
        state.shutdown.clone(),
    );

    let body = ReceiverStream::new(frames).filter_map(|frame| match frame::encode(&frame) {
        Ok(bytes) => Some(Ok::<_, Infallible>(bytes)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode frame, skipping");
            None
        }
    });

    (sse_headers(), Body::from_stream(body)).into_response()
}

fn sse_headers() -> [(HeaderName, HeaderValue); 4] {
    [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream"),
        ),
        (
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-transform"),
        ),
        (
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        ),
        (header::CONNECTION, HeaderValue::from_static("keep-alive")),
    ]
}

// =============================================================================
// Errors
// =============================================================================

/// SSE server errors.
#[derive(Debug, thiserror::Error)]
pub enum SseServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::application::services::SubscriptionRegistry;

    fn app() -> (Router, SharedRegistry) {
        let registry = Arc::new(SubscriptionRegistry::default());
        let state = SseState::new(
            Arc::clone(&registry),
            SessionConfig {
                keep_alive_interval: Duration::from_secs(3600),
                outbound_buffer: 8,
            },
            CancellationToken::new(),
        );
        (router(state), registry)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_match_id_is_bad_request() {
        let (app, registry) = app();
        let response = app
            .oneshot(Request::get("/api/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": MISSING_MATCH_ID}));
        assert_eq!(registry.stats().subscribers, 0);
    }

    #[tokio::test]
    async fn blank_match_id_is_bad_request() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::get("/api/stream?matchId=%20%20")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stream_response_headers() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::get("/api/stream?matchId=42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-transform");
        assert_eq!(headers["x-accel-buffering"], "no");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
    }

    #[tokio::test]
    async fn path_variant_opens_a_stream() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::get("/api/matches/42/stream")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    }
}
