//! Auth endpoints served next to the application's own API

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::{TypedHeader, headers};
use serde::Deserialize;

use super::config::RELAY_CALLBACK_DEFAULT_NEXT;
use super::error::IntoResponseError;
use super::guard::{RelayState, found, with_cookies};
use session_relay::{
    AuthError, RELAY_LOGIN_PATH, RequestCookies, ServerAuthClient, is_safe_redirect,
};

pub(super) fn router(state: RelayState) -> Router {
    Router::new()
        .route("/callback", get(callback))
        .route("/user", get(current_user))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    next: Option<String>,
}

fn request_cookies(cookie: Option<TypedHeader<headers::Cookie>>) -> RequestCookies {
    match cookie {
        Some(TypedHeader(cookie)) => cookie.iter().collect(),
        None => RequestCookies::default(),
    }
}

/// OAuth redirect target: trade the code for a session and land the user
async fn callback(
    State(state): State<RelayState>,
    Query(params): Query<CallbackParams>,
    cookie: Option<TypedHeader<headers::Cookie>>,
) -> Response {
    let failed = format!("{}?error=auth", RELAY_LOGIN_PATH.as_str());

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        tracing::debug!("Auth callback without code");
        return found(&failed);
    };

    let mut client = ServerAuthClient::new(state.backend.clone(), request_cookies(cookie));
    match client.exchange_code_for_session(&code).await {
        Ok(session) => {
            tracing::info!(user_id = %session.user_id, "Code exchanged for session");
            let next = params
                .next
                .filter(|n| is_safe_redirect(n))
                .unwrap_or_else(|| RELAY_CALLBACK_DEFAULT_NEXT.to_string());
            with_cookies(found(&next), &client.take_cookies())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Code exchange failed");
            with_cookies(found(&failed), &client.take_cookies())
        }
    }
}

async fn current_user(
    State(state): State<RelayState>,
    cookie: Option<TypedHeader<headers::Cookie>>,
) -> Response {
    let mut client = ServerAuthClient::new(state.backend.clone(), request_cookies(cookie));
    let result = client
        .get_user()
        .await
        .and_then(|user| user.ok_or(AuthError::NoSession))
        .into_response_error();

    // Cookie writes (including removals of a dead session) go out either way
    let response = match result {
        Ok(user) => Json(user).into_response(),
        Err((status, message)) => {
            tracing::debug!(%status, %message, "No user for request");
            (status, message).into_response()
        }
    };
    with_cookies(response, &client.take_cookies())
}
