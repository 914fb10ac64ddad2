//! session-relay - Session propagation across web pages and browser extensions
//!
//! This crate decides whether a visitor may reach a route given their
//! authentication state and locale, keeps outbound API calls authenticated
//! with a one-shot refresh-and-retry, and hands a live session token from a
//! web page to a sandboxed browser extension. Framework integration lives in
//! `session-relay-axum`.

mod config;
mod handoff;
mod interceptor;
mod locale;
mod navigation;
mod onboarding;
mod provider;
mod receiver;
mod route;
mod session;
mod utils;

#[cfg(test)]
mod test_utils;

pub use config::{
    RELAY_API_BASE_URL, RELAY_API_TIMEOUT_SECS, RELAY_LANDING_PATH, RELAY_LOGIN_PATH,
    RELAY_ONBOARDING_PATH, SUPABASE_ANON_KEY, SUPABASE_URL,
};

pub use locale::{
    Locale, LocalizedPath, UnsupportedLocale, has_locale_prefix, localize, strip_locale,
    with_locale_segment,
};
pub use route::{
    RouteClass, RouteTable, is_guarded_path, is_safe_redirect, post_login_target,
};

pub use session::{
    AuthError, CodeExchange, CookieAuthBackend, CookieOptions, CookieToSet, RequestCookies,
    SameSite, ServerAuthClient, Session, SessionProvider, User, UserLookup,
};

pub use navigation::Navigator;

pub use interceptor::{ApiClient, ApiError, ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};

pub use handoff::{
    Delivery, DirectOutcome, DirectReply, EXTENSION_ID_PARAM, Envelope, ExtensionHost,
    HandoffMessage, HandoffProtocol, HandoffSession, HandoffSettings, HandoffStatus, HandoffView,
    MessagingError, RetryState, ScheduledTask, extension_id_from_query,
};

pub use onboarding::{GateState, OnboardingGate, OnboardingStatus};

pub use receiver::{
    BadgeState, EXTENSION_AUTH_PATH, ExtensionReceiver, InMemoryTokenStore, ReceiverError,
    StoredToken, TokenStore, UserInfo, decode_user_info, extension_login_url,
};

pub use provider::{
    GoTrueClient, ProviderSession, ProviderUser, SupabaseBrowserClient, SupabaseCookieBackend,
    storage_key,
};

pub use utils::{UtilError, append_set_cookies};
