//! Intake server library logic.
//!
//! One axum router serves both deployment shapes of the intake state
//! machine: the telephony webhook surface (one POST per step, TwiML
//! responses) and the agent tool API (an external voice-pipeline agent
//! invoking intake tools by name), plus room token issuance for browser
//! sessions and a health check.

pub mod api_agent;
pub mod api_tokens;
pub mod config;
pub mod middleware;
pub mod sessions;
pub mod twiml;
pub mod webhook;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use intake_core::IntakeNotifier;
use intake_voice::RoomService;
use middleware::RateLimiter;
use serde_json::{json, Value};
use sessions::SessionStore;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Maximum request body size (64 KiB). Webhook forms and tool arguments are
/// tiny; anything larger is not a legitimate request.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Application state shared across all request handlers.
pub struct AppState {
    /// Live conversations, keyed by call/session identifier.
    pub sessions: SessionStore,
    /// Room token issuance and administration.
    pub rooms: Arc<RoomService>,
    /// Notification collaborator fired once per completed intake.
    pub notifier: Arc<dyn IntakeNotifier>,
    /// Rate limiter state.
    pub rate_limiter: RateLimiter,
    /// Seconds a telephony Gather waits for input.
    pub gather_timeout_secs: u64,
}

/// Health check handler.
///
/// Returns `200 OK` with server status and version. Used by load balancers,
/// monitoring, and CI to verify the server is running.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/token", post(api_tokens::token_handler))
        .route("/create-room", post(api_tokens::create_room_handler))
        .route("/api/sessions", post(api_agent::create_session_handler))
        .route(
            "/api/sessions/{sessionId}/tools/{tool}",
            post(api_agent::invoke_tool_handler),
        )
        .route(
            "/api/sessions/{sessionId}/summary",
            get(api_agent::get_summary_handler),
        )
        .route(
            "/api/sessions/{sessionId}",
            axum::routing::delete(api_agent::delete_session_handler),
        )
        .route("/webhook/voice", post(webhook::voice_handler))
        .route("/webhook/status", post(webhook::status_handler))
        .route("/webhook/collect/{step}", post(webhook::collect_handler))
        .route("/webhook/retry/{step}", post(webhook::retry_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(axum::middleware::from_fn(middleware::rate_limit_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
