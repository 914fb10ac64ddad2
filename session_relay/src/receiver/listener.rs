use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::Value;
use url::Url;

use super::errors::ReceiverError;
use super::store::{StoredToken, TokenStore};
use super::user_info::{UserInfo, decode_user_info};
use crate::config::RELAY_LOGIN_PATH;
use crate::handoff::{DirectReply, Envelope};

/// Path of the page that hands the session to the extension
pub const EXTENSION_AUTH_PATH: &str = "/extension-auth";

/// Toolbar badge shown by the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeState {
    Authenticated,
    SignedOut,
}

impl BadgeState {
    pub fn text(&self) -> &'static str {
        match self {
            BadgeState::Authenticated => "",
            BadgeState::SignedOut => "!",
        }
    }

    pub fn color(&self) -> Option<&'static str> {
        match self {
            BadgeState::Authenticated => None,
            BadgeState::SignedOut => Some("#ef4444"),
        }
    }
}

/// Extension side of the handoff: takes tokens in and keeps them
#[derive(Clone)]
pub struct ExtensionReceiver {
    store: Arc<dyn TokenStore>,
}

impl ExtensionReceiver {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Handle a message arriving on the extension's message channel.
    ///
    /// Only `SET_TOKEN` with a non-empty token is accepted; everything else
    /// gets no reply.
    pub async fn handle_message(&self, message: &Value) -> Result<Option<DirectReply>, ReceiverError> {
        let Ok(Envelope::Direct(handoff)) = serde_json::from_value::<Envelope>(message.clone())
        else {
            tracing::debug!("Ignoring non SET_TOKEN message");
            return Ok(None);
        };
        if handoff.token.is_empty() {
            return Ok(None);
        }

        self.set_token(&handoff.token, None).await?;
        tracing::info!("Stored token from web handoff");
        Ok(Some(DirectReply::ok()))
    }

    /// Relay a page broadcast into the extension, as the content script does.
    ///
    /// Only messages posted by the page's own window are bridged.
    pub fn bridge_broadcast(&self, data: &Value, from_same_window: bool) -> Option<Envelope> {
        if !from_same_window {
            return None;
        }
        match serde_json::from_value::<Envelope>(data.clone()) {
            Ok(Envelope::Broadcast(handoff)) if !handoff.token.is_empty() => {
                Some(Envelope::Direct(handoff))
            }
            _ => None,
        }
    }

    pub async fn set_token(
        &self,
        token: &str,
        expires_in: Option<Duration>,
    ) -> Result<(), ReceiverError> {
        let stored = StoredToken {
            token: token.to_string(),
            expires_at: expires_in.map(|d| Utc::now() + d),
            user_info: decode_user_info(token),
        };
        self.store.save(stored).await
    }

    /// The stored token, dropping it first if it has expired
    pub async fn get_token(&self) -> Result<Option<String>, ReceiverError> {
        let Some(stored) = self.store.load().await? else {
            return Ok(None);
        };
        if stored.is_expired(Utc::now()) {
            tracing::info!("Stored token expired, clearing");
            self.store.clear().await?;
            return Ok(None);
        }
        Ok(Some(stored.token))
    }

    /// Re-derive user info from the live token, falling back to what was stored
    pub async fn user_info(&self) -> Result<Option<UserInfo>, ReceiverError> {
        let Some(token) = self.get_token().await? else {
            return Ok(None);
        };
        if let Some(info) = decode_user_info(&token) {
            return Ok(Some(info));
        }
        Ok(self.store.load().await?.and_then(|s| s.user_info))
    }

    pub async fn is_authenticated(&self) -> Result<bool, ReceiverError> {
        Ok(self.get_token().await?.is_some())
    }

    pub async fn clear(&self) -> Result<(), ReceiverError> {
        self.store.clear().await
    }

    pub async fn badge(&self) -> BadgeState {
        match self.is_authenticated().await {
            Ok(true) => BadgeState::Authenticated,
            Ok(false) => BadgeState::SignedOut,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read token for badge");
                BadgeState::SignedOut
            }
        }
    }
}

/// Login URL the extension opens, returning to the handoff page afterwards
pub fn extension_login_url(web_base: &str, extension_id: Option<&str>) -> Result<String, ReceiverError> {
    let mut url = Url::parse(web_base).map_err(|e| ReceiverError::InvalidUrl(e.to_string()))?;
    let return_to = match extension_id {
        Some(id) if !id.is_empty() => {
            format!("{EXTENSION_AUTH_PATH}?ext={}", urlencoding::encode(id))
        }
        _ => EXTENSION_AUTH_PATH.to_string(),
    };
    url.set_path(RELAY_LOGIN_PATH.as_str());
    url.query_pairs_mut().clear().append_pair("redirect", &return_to);
    Ok(url.to_string())
}
