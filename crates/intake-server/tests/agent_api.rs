//! Exercises the agent tool API: sessions, tool dispatch by name, summaries.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use intake_core::NullNotifier;
use intake_server::middleware::RateLimiter;
use intake_server::sessions::SessionStore;
use intake_server::{app, AppState};
use intake_voice::{LiveKitConfig, RoomService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> Router {
    app(AppState {
        sessions: SessionStore::new(),
        rooms: Arc::new(RoomService::new(LiveKitConfig::default())),
        notifier: Arc::new(NullNotifier),
        rate_limiter: RateLimiter::new(),
        gather_timeout_secs: 5,
    })
}

async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn invoke(app: &Router, session_id: &str, tool: &str, args: Value) -> (StatusCode, Value) {
    request(
        app,
        Method::POST,
        &format!("/api/sessions/{session_id}/tools/{tool}"),
        Some(args),
    )
    .await
}

#[tokio::test]
async fn tool_sequence_completes_an_intake() {
    let app = test_app();

    let (status, created) = request(&app, Method::POST, "/api/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    let session_id = created["sessionId"].as_str().unwrap().to_string();

    let (status, reply) = invoke(
        &app,
        &session_id,
        "store_patient_name",
        json!({"name": "Jane Doe"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(reply["message"].as_str().unwrap().contains("Jane Doe"));

    invoke(
        &app,
        &session_id,
        "store_date_of_birth",
        json!({"date_of_birth": "01/02/1990"}),
    )
    .await;
    invoke(
        &app,
        &session_id,
        "store_insurance",
        json!({"payer_name": "Acme Health", "insurance_id": "AH123"}),
    )
    .await;

    // Declining a referral discards whatever physician was passed.
    invoke(
        &app,
        &session_id,
        "store_referral_info",
        json!({"has_referral": false, "physician_name": "Dr. Strange"}),
    )
    .await;

    invoke(
        &app,
        &session_id,
        "store_chief_complaint",
        json!({"complaint": "back pain"}),
    )
    .await;

    // Invalid address: stage holds, message names the missing parts.
    let (_, rejected) = invoke(
        &app,
        &session_id,
        "store_and_validate_address",
        json!({"address": "Main St"}),
    )
    .await;
    assert!(rejected["message"]
        .as_str()
        .unwrap()
        .contains("street number, city, state, ZIP code"));

    invoke(
        &app,
        &session_id,
        "store_and_validate_address",
        json!({"address": "1 Elm St, Boston, MA, 02108"}),
    )
    .await;
    invoke(
        &app,
        &session_id,
        "store_contact_info",
        json!({"phone": "555-1234"}),
    )
    .await;

    let (status, listing) = invoke(&app, &session_id, "get_available_appointments", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listing["message"]
        .as_str()
        .unwrap()
        .contains("Here are the available appointments:"));

    let (status, summary) = request(
        &app,
        Method::GET,
        &format!("/api/sessions/{session_id}/summary"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["stage"], "complete");
    assert_eq!(summary["name"], "Jane Doe");
    assert_eq!(summary["has_referral"], false);
    assert_eq!(summary["referral_physician"], Value::Null);
    assert_eq!(summary["address_valid"], true);

    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/api/sessions/{session_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
        &app,
        Method::GET,
        &format!("/api/sessions/{session_id}/summary"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_tool_is_rejected() {
    let app = test_app();
    let (_, created) = request(&app, Method::POST, "/api/sessions", None).await;
    let session_id = created["sessionId"].as_str().unwrap().to_string();

    let (status, body) = invoke(&app, &session_id, "store_everything", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("unknown tool"));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = test_app();
    let (status, _) = invoke(&app, "no-such-session", "get_patient_summary", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_arguments_are_a_bad_request() {
    let app = test_app();
    let (_, created) = request(&app, Method::POST, "/api/sessions", None).await;
    let session_id = created["sessionId"].as_str().unwrap().to_string();

    let (status, body) = invoke(&app, &session_id, "store_patient_name", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn sessions_do_not_share_state() {
    let app = test_app();
    let (_, a) = request(&app, Method::POST, "/api/sessions", None).await;
    let (_, b) = request(&app, Method::POST, "/api/sessions", None).await;
    let a = a["sessionId"].as_str().unwrap().to_string();
    let b = b["sessionId"].as_str().unwrap().to_string();

    invoke(&app, &a, "store_patient_name", json!({"name": "Alice"})).await;

    let (_, summary_b) = request(&app, Method::GET, &format!("/api/sessions/{b}/summary"), None).await;
    assert_eq!(summary_b["name"], Value::Null);
    assert_eq!(summary_b["stage"], "greeting");
}
