//! session-relay-axum - axum integration for session-relay
//!
//! Provides the edge route guard as a middleware wrapper, the auth callback
//! endpoints, and extractors for the locale and pathname the guard resolved.

mod auth;
mod config;
mod error;
mod extract;
mod guard;
mod router;


pub use config::{RELAY_CALLBACK_DEFAULT_NEXT, RELAY_PATHNAME_HEADER};
pub use extract::{RequestPathname, ResolvedLocale};
pub use guard::{RelayState, route_guard, with_route_guard};
pub use router::{session_relay_router, session_relay_router_no_trace};

// Re-export the core crate so applications need a single dependency
pub use session_relay;
