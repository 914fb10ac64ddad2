use std::sync::Arc;

use axum::Router;

use session_relay_axum::session_relay::SupabaseCookieBackend;
use session_relay_axum::{RelayState, session_relay_router, with_route_guard};

mod pages;
mod server;

use crate::server::{init_tracing, spawn_http_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("demo_relay");

    let backend = SupabaseCookieBackend::from_env()?;
    let state = RelayState::new(Arc::new(backend));

    let app = Router::new()
        .merge(pages::router())
        .nest("/api", session_relay_router(state.clone()));

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    spawn_http_server(port, with_route_guard(app, state)).await??;
    Ok(())
}
