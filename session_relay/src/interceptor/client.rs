use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::errors::ApiError;
use super::transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
use crate::config::RELAY_LOGIN_PATH;
use crate::navigation::Navigator;
use crate::session::SessionProvider;

/// Per-call state. Lives on the stack of a single `send`, so concurrent
/// calls never see each other's retry flag.
#[derive(Debug, Default)]
struct CallContext {
    retried: bool,
}

/// API client that attaches the session's bearer token to every call and
/// recovers from one 401 per call by refreshing the session.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    provider: Arc<dyn SessionProvider>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        provider: Arc<dyn SessionProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            provider,
            navigator,
        }
    }

    /// Client over a [`ReqwestTransport`] configured from the environment
    pub fn from_env(
        provider: Arc<dyn SessionProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        Ok(Self::new(
            Arc::new(ReqwestTransport::from_env()?),
            provider,
            navigator,
        ))
    }

    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut ctx = CallContext::default();
        self.attach_current_token(&mut request).await?;

        loop {
            let response = self.transport.execute(&request).await?;
            if response.status != StatusCode::UNAUTHORIZED || ctx.retried {
                return response.into_result();
            }

            ctx.retried = true;
            match self.refreshed_token().await {
                Some(token) => {
                    tracing::debug!(path = %request.path, "Retrying request with refreshed token");
                    request.set_bearer(&token)?;
                }
                None => {
                    self.force_sign_out().await;
                    return response.into_result();
                }
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Serde(e.to_string()))?;
        self.send(ApiRequest::post(path, body)).await?.json()
    }

    // A missing token is not an error: the call just goes out unauthenticated
    async fn attach_current_token(&self, request: &mut ApiRequest) -> Result<(), ApiError> {
        match self.provider.get_session().await {
            Ok(Some(session)) => request.set_bearer(&session.access_token),
            Ok(None) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read session, sending without token");
                Ok(())
            }
        }
    }

    async fn refreshed_token(&self) -> Option<String> {
        match self.provider.refresh_session().await {
            Ok(Some(session)) => Some(session.access_token),
            Ok(None) => {
                tracing::info!("Session refresh returned no session");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh failed");
                None
            }
        }
    }

    async fn force_sign_out(&self) {
        if let Err(e) = self.provider.sign_out().await {
            tracing::error!(error = %e, "Sign-out after failed refresh did not complete");
        }
        self.navigator.navigate(RELAY_LOGIN_PATH.as_str());
    }
}
