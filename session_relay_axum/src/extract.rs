use std::convert::Infallible;

use axum::extract::FromRequestParts;
use http::request::Parts;
use session_relay::{Locale, LocalizedPath};

/// Locale that applies to the current request.
///
/// Set by the route guard. Without the guard it is re-derived from the URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLocale(pub Locale);

/// Pathname as the browser requested it, before any internal rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPathname(pub String);

impl<S> FromRequestParts<S> for ResolvedLocale
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(locale) = parts.extensions.get::<ResolvedLocale>() {
            return Ok(*locale);
        }
        Ok(ResolvedLocale(LocalizedPath::parse(parts.uri.path()).locale))
    }
}

impl<S> FromRequestParts<S> for RequestPathname
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(pathname) = parts.extensions.get::<RequestPathname>() {
            return Ok(pathname.clone());
        }
        Ok(RequestPathname(parts.uri.path().to_string()))
    }
}
