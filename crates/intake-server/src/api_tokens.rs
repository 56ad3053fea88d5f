//! Room token issuance for browser/front-end intake sessions.
//!
//! A front end posts a room name and gets back a signed join grant; a
//! separate endpoint creates the room under an administrative grant so the
//! intake agent can be dispatched into it.

use crate::api_agent::ApiError;
use crate::AppState;
use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Request body for `POST /token`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(rename = "roomName")]
    pub room_name: String,
    /// Participant identity; defaults to "guest".
    #[serde(default)]
    pub identity: Option<String>,
}

/// Response body for `POST /token`.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Request body for `POST /create-room`.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(rename = "roomName")]
    pub room_name: String,
}

/// Handler for `POST /token`.
///
/// Issues a join token for the given room and identity.
pub async fn token_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if payload.room_name.trim().is_empty() {
        return Err(ApiError::BadRequest("roomName is required".to_string()));
    }

    let identity = payload.identity.as_deref().unwrap_or("guest");
    let token = state
        .rooms
        .participant_token(&payload.room_name, identity, identity)
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    tracing::info!(room = payload.room_name, identity, "issued join token");
    Ok(Json(TokenResponse { token }))
}

/// Handler for `POST /create-room`.
///
/// Creates the room for an intake session under an administrative grant.
/// Room creation failures are reported, not fatal: the caller decides
/// whether to retry or fall back.
pub async fn create_room_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<Json<Value>, ApiError> {
    if payload.room_name.trim().is_empty() {
        return Err(ApiError::BadRequest("roomName is required".to_string()));
    }

    match state.rooms.create_call_room(&payload.room_name).await {
        Ok(_) => {
            tracing::info!(room = payload.room_name, "created intake room");
            Ok(Json(json!({ "success": true, "room": payload.room_name })))
        }
        Err(e) => {
            tracing::warn!(room = payload.room_name, "room creation failed: {e}");
            Err(ApiError::Upstream(e.to_string()))
        }
    }
}
