//! Central configuration for the session_relay_axum crate

use std::sync::LazyLock;

/// Response header carrying the pathname the browser asked for
/// Default: "x-pathname"
pub static RELAY_PATHNAME_HEADER: LazyLock<String> = LazyLock::new(|| {
    std::env::var("RELAY_PATHNAME_HEADER").unwrap_or_else(|_| "x-pathname".to_string())
});

/// Where the auth callback sends the user when no usable `next` was given
/// Default: "/articles"
pub static RELAY_CALLBACK_DEFAULT_NEXT: LazyLock<String> = LazyLock::new(|| {
    std::env::var("RELAY_CALLBACK_DEFAULT_NEXT").unwrap_or_else(|_| "/articles".to_string())
});
