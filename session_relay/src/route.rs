//! Route classification by authentication requirement

use crate::config::RELAY_LANDING_PATH;
use crate::locale::{Locale, LocalizedPath, has_locale_prefix, localize};

/// What a route demands of the visitor's authentication state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a session
    Protected,
    /// Must not be reached with a session (e.g. the login page)
    AuthOnly,
    Public,
}

/// Prefix lists that drive [`RouteClass`] decisions
#[derive(Debug, Clone)]
pub struct RouteTable {
    protected: Vec<String>,
    auth_only: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(
            ["/articles", "/dashboard", "/settings", "/extension-auth", "/onboarding"],
            ["/login"],
        )
    }
}

impl RouteTable {
    pub fn new<P, A, S>(protected: P, auth_only: A) -> Self
    where
        P: IntoIterator<Item = S>,
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protected: protected.into_iter().map(Into::into).collect(),
            auth_only: auth_only.into_iter().map(Into::into).collect(),
        }
    }

    /// Classify a path that has already had its locale segment removed
    pub fn classify(&self, path_without_locale: &str) -> RouteClass {
        if matches_any(&self.protected, path_without_locale) {
            RouteClass::Protected
        } else if matches_any(&self.auth_only, path_without_locale) {
            RouteClass::AuthOnly
        } else {
            RouteClass::Public
        }
    }

    /// Classify a raw request path, stripping any locale prefix first
    pub fn classify_request_path(&self, pathname: &str) -> RouteClass {
        self.classify(&LocalizedPath::parse(pathname).path_without_locale)
    }
}

fn matches_any(prefixes: &[String], path: &str) -> bool {
    prefixes.iter().any(|prefix| {
        path == prefix
            || path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Accept a caller-supplied redirect target only if it stays on this origin
pub fn is_safe_redirect(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\")
}

/// Where an already-authenticated visitor of an auth-only page is sent.
///
/// A safe `redirect` parameter wins over the landing route. Targets that
/// already carry a locale segment are used as-is; anything else is localized.
pub fn post_login_target(redirect_param: Option<&str>, locale: Locale) -> String {
    let target = redirect_param
        .filter(|t| is_safe_redirect(t))
        .unwrap_or(RELAY_LANDING_PATH.as_str());

    if has_locale_prefix(target) {
        target.to_string()
    } else {
        localize(target, locale)
    }
}

const UNGUARDED_PREFIXES: [&str; 4] = ["/api", "/_proxy", "/_next", "/_vercel"];

/// Whether a request path is a page the guard should look at.
///
/// API routes, the API proxy, framework internals and anything that looks
/// like a static file (a `.` anywhere in the path) are skipped.
pub fn is_guarded_path(pathname: &str) -> bool {
    !UNGUARDED_PREFIXES.iter().any(|p| pathname.starts_with(p)) && !pathname.contains('.')
}
