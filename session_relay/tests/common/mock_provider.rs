//! Axum-based stand-in for the identity provider's `/auth/v1` endpoints
//!
//! Each test starts its own server on an ephemeral port, so tests never share
//! provider state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Value, json};

pub const ANON_KEY: &str = "test-anon-key";
pub const VALID_ACCESS: &str = "valid-access";
pub const FRESH_ACCESS: &str = "fresh-access";
pub const GOOD_REFRESH: &str = "good-refresh";
pub const AUTH_CODE: &str = "code-1";
pub const CODE_VERIFIER: &str = "verifier-1";

#[derive(Clone, Default)]
pub struct MockProviderState {
    pub refresh_calls: Arc<AtomicUsize>,
    pub logout_calls: Arc<AtomicUsize>,
    pub last_logout_token: Arc<Mutex<Option<String>>>,
}

pub struct MockProvider {
    pub base_url: String,
    pub state: MockProviderState,
}

impl MockProvider {
    pub async fn start() -> Self {
        let state = MockProviderState::default();
        let app = Router::new()
            .route("/auth/v1/user", get(user))
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/logout", post(logout))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock provider");
        let addr = listener.local_addr().expect("Mock provider has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            // `localhost` keeps the derived cookie name stable across ports
            base_url: format!("http://localhost:{}", addr.port()),
            state,
        }
    }
}

/// Session JSON exactly as the provider returns it
pub fn session_json(access_token: &str, refresh_token: &str, expires_at: i64) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": expires_at,
        "refresh_token": refresh_token,
        "user": {"id": "user-1", "email": "user-1@example.com", "aud": "authenticated"}
    })
}

/// `base64-` cookie encoding used for the session cookie
pub fn cookie_value(session: &Value) -> String {
    format!("base64-{}", URL_SAFE_NO_PAD.encode(session.to_string()))
}

pub fn decode_cookie_value(value: &str) -> Value {
    let encoded = value.strip_prefix("base64-").expect("Missing base64- prefix");
    let bytes = URL_SAFE_NO_PAD.decode(encoded).expect("Cookie is not base64url");
    serde_json::from_slice(&bytes).expect("Cookie is not JSON")
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn has_api_key(headers: &HeaderMap) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(ANON_KEY)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

async fn user(headers: HeaderMap) -> Response {
    if !has_api_key(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"msg": "No API key found"}))).into_response();
    }
    match bearer(&headers).as_deref() {
        Some(VALID_ACCESS) | Some(FRESH_ACCESS) => Json(json!({
            "id": "user-1",
            "email": "user-1@example.com",
            "aud": "authenticated"
        }))
        .into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": 401, "msg": "invalid JWT"})),
        )
            .into_response(),
    }
}

async fn token(
    State(state): State<MockProviderState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !has_api_key(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"msg": "No API key found"}))).into_response();
    }
    let invalid_grant = |description: &str| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": description})),
        )
            .into_response()
    };

    match query.get("grant_type").map(String::as_str) {
        Some("refresh_token") => {
            state.refresh_calls.fetch_add(1, Ordering::SeqCst);
            if body["refresh_token"] == GOOD_REFRESH {
                Json(session_json(FRESH_ACCESS, "rotated-refresh", now() + 3600)).into_response()
            } else {
                invalid_grant("Invalid Refresh Token")
            }
        }
        Some("pkce") => {
            if body["auth_code"] == AUTH_CODE && body["code_verifier"] == CODE_VERIFIER {
                Json(session_json(VALID_ACCESS, GOOD_REFRESH, now() + 3600)).into_response()
            } else {
                invalid_grant("invalid flow state")
            }
        }
        _ => invalid_grant("unsupported grant_type"),
    }
}

async fn logout(State(state): State<MockProviderState>, headers: HeaderMap) -> StatusCode {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_logout_token.lock().unwrap() = bearer(&headers);
    StatusCode::NO_CONTENT
}
