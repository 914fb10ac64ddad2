//! Central configuration for the session_relay crate

use std::str::FromStr;
use std::sync::LazyLock;

/// Path of the login page, before localization
/// Default: "/login"
pub static RELAY_LOGIN_PATH: LazyLock<String> =
    LazyLock::new(|| env_or("RELAY_LOGIN_PATH", "/login"));

/// Landing route for authenticated users bounced off auth-only pages
/// Default: "/dashboard"
pub static RELAY_LANDING_PATH: LazyLock<String> =
    LazyLock::new(|| env_or("RELAY_LANDING_PATH", "/dashboard"));

/// Path of the first-run setup flow
/// Default: "/onboarding"
pub static RELAY_ONBOARDING_PATH: LazyLock<String> =
    LazyLock::new(|| env_or("RELAY_ONBOARDING_PATH", "/onboarding"));

/// Base URL every intercepted API call is resolved against
/// Default: "http://localhost:3000/_proxy"
pub static RELAY_API_BASE_URL: LazyLock<String> =
    LazyLock::new(|| env_or("RELAY_API_BASE_URL", "http://localhost:3000/_proxy"));

pub static RELAY_API_TIMEOUT_SECS: LazyLock<u64> =
    LazyLock::new(|| env_parse("RELAY_API_TIMEOUT_SECS").unwrap_or(30));

pub(crate) static RELAY_HANDOFF_MAX_ATTEMPTS: LazyLock<u32> = LazyLock::new(|| {
    env_parse("RELAY_HANDOFF_MAX_ATTEMPTS")
        .filter(|n| *n > 0)
        .unwrap_or(10)
});

pub(crate) static RELAY_HANDOFF_INTERVAL_MS: LazyLock<u64> =
    LazyLock::new(|| env_parse("RELAY_HANDOFF_INTERVAL_MS").unwrap_or(500));

pub(crate) static RELAY_HANDOFF_DIRECT_TIMEOUT_MS: LazyLock<u64> =
    LazyLock::new(|| env_parse("RELAY_HANDOFF_DIRECT_TIMEOUT_MS").unwrap_or(2000));

pub(crate) static RELAY_HANDOFF_CLOSE_COUNTDOWN_SECS: LazyLock<u32> =
    LazyLock::new(|| env_parse("RELAY_HANDOFF_CLOSE_COUNTDOWN_SECS").unwrap_or(3));

/// Identity provider origin
/// Default: "http://localhost:54321"
pub static SUPABASE_URL: LazyLock<String> =
    LazyLock::new(|| env_or("SUPABASE_URL", "http://localhost:54321"));

/// Public (anon) API key sent as `apikey` on every provider call
pub static SUPABASE_ANON_KEY: LazyLock<String> =
    LazyLock::new(|| env_or("SUPABASE_ANON_KEY", ""));

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
