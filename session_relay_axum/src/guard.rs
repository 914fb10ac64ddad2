use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Query, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use http::header::{HeaderName, HeaderValue, LOCATION};
use http::{StatusCode, Uri};
use serde::Deserialize;
use url::{Position, Url};

use super::config::RELAY_PATHNAME_HEADER;
use super::error::IntoResponseError;
use super::extract::{RequestPathname, ResolvedLocale};
use session_relay::{
    CookieAuthBackend, CookieToSet, Locale, LocalizedPath, RELAY_LOGIN_PATH, RouteClass,
    RouteTable, ServerAuthClient, append_set_cookies, is_guarded_path, localize,
    post_login_target, with_locale_segment,
};

/// Shared, read-only state for the guard and the auth routes
#[derive(Clone)]
pub struct RelayState {
    pub(crate) backend: Arc<dyn CookieAuthBackend>,
    pub(crate) routes: Arc<RouteTable>,
}

impl RelayState {
    pub fn new(backend: Arc<dyn CookieAuthBackend>) -> Self {
        Self::with_routes(backend, RouteTable::default())
    }

    pub fn with_routes(backend: Arc<dyn CookieAuthBackend>, routes: RouteTable) -> Self {
        Self {
            backend,
            routes: Arc::new(routes),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GuardQuery {
    redirect: Option<String>,
}

/// Wrap `app` so every request passes the route guard before routing.
///
/// The guard may rewrite the URI (`/articles` to `/<default>/articles`), so it
/// has to sit outside the router rather than be layered onto its routes.
pub fn with_route_guard(app: Router, state: RelayState) -> Router {
    Router::new()
        .fallback_service(app)
        .layer(middleware::from_fn_with_state(state, route_guard))
}

/// Edge route guard.
///
/// Re-validates the session from the request cookies on every page request,
/// then either redirects according to the route class or hands the request on
/// with its locale resolved.
pub async fn route_guard(
    State(state): State<RelayState>,
    mut req: Request,
    next: Next,
) -> Response {
    let pathname = req.uri().path().to_string();
    if !is_guarded_path(&pathname) {
        return next.run(req).await;
    }

    let localized = LocalizedPath::parse(&pathname);
    let mut client = ServerAuthClient::from_headers(state.backend.clone(), req.headers());
    let user = client.current_user().await;
    let class = state.routes.classify(&localized.path_without_locale);
    tracing::debug!(
        %pathname,
        locale = %localized.locale,
        ?class,
        authenticated = user.is_some(),
        "Route guard decision"
    );

    let response = match class {
        RouteClass::Protected if user.is_none() => {
            found(&localize(RELAY_LOGIN_PATH.as_str(), localized.locale))
        }
        RouteClass::AuthOnly if user.is_some() => {
            let query = Query::<GuardQuery>::try_from_uri(req.uri())
                .map(|Query(q)| q)
                .unwrap_or_default();
            found(&post_login_target(query.redirect.as_deref(), localized.locale))
        }
        _ => {
            if let Some(user) = user {
                req.extensions_mut().insert(user);
            }
            pass_through(req, next, &localized, &pathname).await
        }
    };

    with_cookies(response, &client.take_cookies())
}

async fn pass_through(
    mut req: Request,
    next: Next,
    localized: &LocalizedPath,
    pathname: &str,
) -> Response {
    let query = req.uri().query().map(str::to_string);

    if localized.explicit && localized.locale.is_default() {
        // Default locale never appears in URLs
        return found(&with_query(&localized.path_without_locale, query.as_deref()));
    }

    if !localized.explicit {
        let rewritten = with_query(
            &with_locale_segment(&localized.path_without_locale, Locale::DEFAULT),
            query.as_deref(),
        );
        match rewritten.parse::<Uri>() {
            Ok(uri) => *req.uri_mut() = uri,
            Err(e) => tracing::error!(error = %e, "Failed to rewrite request URI"),
        }
    }

    req.extensions_mut().insert(ResolvedLocale(localized.locale));
    req.extensions_mut()
        .insert(RequestPathname(pathname.to_string()));

    let mut response = next.run(req).await;
    stamp_pathname(&mut response, pathname);
    response
}

fn with_query(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    }
}

/// 302 to the same-origin `location`
pub(crate) fn found(location: &str) -> Response {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, encode_location(location))
        .body(Body::empty())
        .into_response_error()
        .into_response()
}

// Percent-encode what a decoded query parameter may carry (non-ASCII, spaces)
fn encode_location(location: &str) -> String {
    Url::parse("http://localhost/")
        .and_then(|base| base.join(location))
        .map(|url| url[Position::BeforePath..].to_string())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, %location, "Failed to normalize redirect location");
            location.to_string()
        })
}

pub(crate) fn with_cookies(mut response: Response, cookies: &[CookieToSet]) -> Response {
    let values: Vec<String> = cookies.iter().map(CookieToSet::to_header_value).collect();
    if let Err(e) = append_set_cookies(response.headers_mut(), values.iter().map(String::as_str)) {
        tracing::error!(error = %e, "Failed to copy provider cookies onto response");
    }
    response
}

fn stamp_pathname(response: &mut Response, pathname: &str) {
    let name = HeaderName::from_bytes(RELAY_PATHNAME_HEADER.as_bytes());
    let value = HeaderValue::from_str(pathname);
    match (name, value) {
        (Ok(name), Ok(value)) => {
            response.headers_mut().insert(name, value);
        }
        _ => tracing::error!("Failed to set pathname header"),
    }
}
