//! JSON API for the voice-pipeline deployment shape.
//!
//! An external agent runtime (the LLM-driven voice pipeline) owns the
//! conversation and invokes intake tools by name, one HTTP call per tool
//! use. The tools carry no ordering guards: the agent may call them in any
//! order, and each call overwrites its target fields (see `intake-core`).

use crate::AppState;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use intake_core::{tools, ToolError, ToolName};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Response body for session creation.
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Response body for a tool invocation: the sentence the agent speaks back.
#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub message: String,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream service error: {0}")]
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<ToolError> for ApiError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::UnknownTool(name) => ApiError::BadRequest(format!("unknown tool: {name}")),
            ToolError::BadArgs(msg) => ApiError::BadRequest(msg),
        }
    }
}

/// Handler for `POST /api/sessions`.
///
/// Starts a new intake conversation and returns its identifier.
pub async fn create_session_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<CreateSessionResponse> {
    let session_id = Uuid::new_v4().to_string();
    state.sessions.create(&session_id);
    tracing::info!(session_id, "created intake session");
    Json(CreateSessionResponse { session_id })
}

/// Handler for `POST /api/sessions/{sessionId}/tools/{tool}`.
///
/// Invokes one intake tool by name with JSON arguments. Argument-less tools
/// take an empty object.
pub async fn invoke_tool_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((session_id, tool_name)): Path<(String, String)>,
    Json(args): Json<Value>,
) -> Result<Json<ToolResponse>, ApiError> {
    let tool: ToolName = tool_name.parse()?;
    let conversation = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("no such session: {session_id}")))?;

    let mut guard = conversation.lock().await;
    let message = tools::invoke(&mut guard.intake, tool, &args, state.notifier.as_ref()).await?;
    tracing::info!(
        session_id,
        tool = tool.as_str(),
        stage = guard.intake.stage().as_str(),
        "tool invoked"
    );

    Ok(Json(ToolResponse { message }))
}

/// Handler for `GET /api/sessions/{sessionId}/summary`.
///
/// Returns the full record collected so far; unfilled fields are null.
pub async fn get_summary_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<intake_types::PatientRecord>, ApiError> {
    let conversation = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("no such session: {session_id}")))?;

    let record = conversation.lock().await.intake.record().clone();
    Ok(Json(record))
}

/// Handler for `DELETE /api/sessions/{sessionId}`.
///
/// Ends the conversation and discards its record (nothing is persisted).
pub async fn delete_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&session_id) {
        tracing::info!(session_id, "intake session discarded");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("no such session: {session_id}")))
    }
}
