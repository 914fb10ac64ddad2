use axum::{
    Extension, Router,
    response::{Html, IntoResponse, Response},
    routing::get,
};

use session_relay_axum::session_relay::{Locale, User, localize};
use session_relay_axum::{RequestPathname, ResolvedLocale};

/// Pages always see a locale-qualified path; the guard rewrites bare ones
pub(super) fn router() -> Router {
    Router::new()
        .route("/{locale}", get(home))
        .route("/{locale}/login", get(login))
        .route("/{locale}/dashboard", get(dashboard))
        .route("/{locale}/articles", get(dashboard))
        .route("/{locale}/onboarding", get(dashboard))
}

fn page(locale: Locale, pathname: &str, body: String) -> Response {
    Html(format!(
        "<!doctype html><html lang=\"{locale}\"><body><p>{pathname}</p>{body}</body></html>"
    ))
    .into_response()
}

async fn home(
    ResolvedLocale(locale): ResolvedLocale,
    RequestPathname(pathname): RequestPathname,
) -> Response {
    let links = format!(
        "<a href=\"{}\">Sign in</a> <a href=\"{}\">Dashboard</a>",
        localize("/login", locale),
        localize("/dashboard", locale)
    );
    page(locale, &pathname, links)
}

async fn login(
    ResolvedLocale(locale): ResolvedLocale,
    RequestPathname(pathname): RequestPathname,
) -> Response {
    page(
        locale,
        &pathname,
        "<p>Sign in with your provider, which redirects to /api/auth/callback</p>".to_string(),
    )
}

async fn dashboard(
    ResolvedLocale(locale): ResolvedLocale,
    RequestPathname(pathname): RequestPathname,
    Extension(user): Extension<User>,
) -> Response {
    let email = user.email.unwrap_or_else(|| user.id.clone());
    page(locale, &pathname, format!("<p>Signed in as {email}</p>"))
}
