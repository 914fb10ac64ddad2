//! Router for the relay's own endpoints

use axum::Router;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::guard::RelayState;

/// Auth endpoints with HTTP tracing, meant to be nested under `/api`:
/// - `/auth/callback`
/// - `/auth/user`
///
/// `/api` is outside the route guard, so these are reachable without a session.
pub fn session_relay_router(state: RelayState) -> Router {
    session_relay_router_no_trace(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same as [`session_relay_router`] without the tracing layer
pub fn session_relay_router_no_trace(state: RelayState) -> Router {
    Router::new().nest("/auth", super::auth::router(state))
}
