use std::sync::Arc;

use async_trait::async_trait;
use http::header::HeaderMap;

use super::cookie::{CookieToSet, RequestCookies};
use super::errors::AuthError;
use super::types::{Session, User};

/// Result of validating a cookie-backed session
#[derive(Debug, Clone, Default)]
pub struct UserLookup {
    pub user: Option<User>,
    /// Cookies the provider rotated while validating; must reach the browser
    pub cookies_to_set: Vec<CookieToSet>,
}

#[derive(Debug, Clone)]
pub struct CodeExchange {
    pub session: Session,
    pub cookies_to_set: Vec<CookieToSet>,
}

/// Server-side view of the identity provider, driven purely by cookies.
///
/// Implementations must validate against the provider rather than trusting
/// the cookie contents, so a stale or tampered cookie yields no user.
#[async_trait]
pub trait CookieAuthBackend: Send + Sync + 'static {
    async fn get_user(&self, cookies: &RequestCookies) -> Result<UserLookup, AuthError>;

    /// Mint the initial session from an OAuth redirect code
    async fn exchange_code_for_session(
        &self,
        cookies: &RequestCookies,
        code: &str,
    ) -> Result<CodeExchange, AuthError>;
}

/// Client-side handle on the identity provider's session store
#[async_trait]
pub trait SessionProvider: Send + Sync + 'static {
    /// The current session, reflecting the provider's store rather than a stale copy
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    async fn refresh_session(&self) -> Result<Option<Session>, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Provider client bound to a single request's cookies.
///
/// Built fresh for every request; collects the cookie writes the provider
/// asks for so the caller can copy them onto whatever response it returns.
pub struct ServerAuthClient {
    backend: Arc<dyn CookieAuthBackend>,
    cookies: RequestCookies,
    pending: Vec<CookieToSet>,
}

impl ServerAuthClient {
    pub fn new(backend: Arc<dyn CookieAuthBackend>, cookies: RequestCookies) -> Self {
        Self {
            backend,
            cookies,
            pending: Vec::new(),
        }
    }

    pub fn from_headers(backend: Arc<dyn CookieAuthBackend>, headers: &HeaderMap) -> Self {
        Self::new(backend, RequestCookies::from_headers(headers))
    }

    pub async fn get_user(&mut self) -> Result<Option<User>, AuthError> {
        let lookup = self.backend.get_user(&self.cookies).await?;
        self.record(lookup.cookies_to_set);
        Ok(lookup.user)
    }

    /// Like [`get_user`](Self::get_user) but treats any provider failure as
    /// "not signed in".
    pub async fn current_user(&mut self) -> Option<User> {
        match self.get_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Session validation failed, treating as anonymous");
                None
            }
        }
    }

    pub async fn exchange_code_for_session(&mut self, code: &str) -> Result<Session, AuthError> {
        let exchange = self
            .backend
            .exchange_code_for_session(&self.cookies, code)
            .await?;
        self.record(exchange.cookies_to_set);
        Ok(exchange.session)
    }

    /// Drain the cookie writes accumulated so far
    pub fn take_cookies(&mut self) -> Vec<CookieToSet> {
        std::mem::take(&mut self.pending)
    }

    fn record(&mut self, cookies: Vec<CookieToSet>) {
        for cookie in cookies {
            self.cookies.apply(&cookie);
            // A later write to the same cookie supersedes an earlier one
            self.pending.retain(|c| c.name != cookie.name);
            self.pending.push(cookie);
        }
    }
}
