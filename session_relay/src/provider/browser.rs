use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use super::gotrue::{GoTrueClient, ProviderSession};
use crate::session::{AuthError, Session, SessionProvider};

const AUTO_REFRESH_MARGIN_SECS: i64 = 10;

/// Client-side provider handle holding the provider's in-memory session.
///
/// Constructed once per page and passed to whatever needs it; there is no
/// process-wide instance.
pub struct SupabaseBrowserClient {
    client: GoTrueClient,
    current: RwLock<Option<ProviderSession>>,
}

impl SupabaseBrowserClient {
    pub fn new(client: GoTrueClient) -> Self {
        Self {
            client,
            current: RwLock::new(None),
        }
    }

    pub fn from_env() -> Result<Self, AuthError> {
        Ok(Self::new(GoTrueClient::from_env()?))
    }

    /// Adopt a session obtained elsewhere (e.g. decoded from the auth cookie)
    pub async fn set_session(&self, session: ProviderSession) {
        *self.current.write().await = Some(session);
    }

    async fn refresh_with(&self, refresh_token: &str) -> Result<Option<Session>, AuthError> {
        match self.client.refresh(refresh_token).await {
            Ok(refreshed) => {
                let session = refreshed.to_session();
                *self.current.write().await = Some(refreshed);
                Ok(Some(session))
            }
            Err(e) => {
                if e.is_unauthorized() || matches!(e, AuthError::Provider { status: 400, .. }) {
                    tracing::info!("Refresh token rejected, dropping local session");
                    self.current.write().await.take();
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl SessionProvider for SupabaseBrowserClient {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(current) = self.current.read().await.clone() else {
            return Ok(None);
        };
        let session = current.to_session();
        if session.expires_within(Utc::now(), Duration::seconds(AUTO_REFRESH_MARGIN_SECS)) {
            tracing::debug!("Stored session is expiring, refreshing before use");
            return self.refresh_with(&current.refresh_token).await;
        }
        Ok(Some(session))
    }

    async fn refresh_session(&self) -> Result<Option<Session>, AuthError> {
        let refresh_token = self
            .current
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NoSession)?;
        self.refresh_with(&refresh_token).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(current) = self.current.write().await.take() else {
            return Ok(());
        };
        // The local session is gone either way
        if let Err(e) = self.client.logout(&current.access_token).await {
            tracing::warn!(error = %e, "Provider sign-out failed");
        }
        Ok(())
    }
}
