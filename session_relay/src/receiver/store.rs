use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::errors::ReceiverError;
use super::user_info::UserInfo;

/// What the extension keeps after a successful handoff
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
}

impl StoredToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user_info", &self.user_info)
            .finish()
    }
}

/// Extension-local persistence for the handed-off token
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    async fn load(&self) -> Result<Option<StoredToken>, ReceiverError>;

    async fn save(&self, token: StoredToken) -> Result<(), ReceiverError>;

    async fn clear(&self) -> Result<(), ReceiverError>;
}

#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    entry: Mutex<Option<StoredToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory token store");
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self) -> Result<Option<StoredToken>, ReceiverError> {
        Ok(self.entry.lock().await.clone())
    }

    async fn save(&self, token: StoredToken) -> Result<(), ReceiverError> {
        *self.entry.lock().await = Some(token);
        Ok(())
    }

    async fn clear(&self) -> Result<(), ReceiverError> {
        self.entry.lock().await.take();
        Ok(())
    }
}
