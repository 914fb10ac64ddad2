use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::message::Envelope;

/// What the extension answers on the direct channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl DirectReply {
    pub fn ok() -> Self {
        Self {
            success: Some(true),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessagingError {
    /// The call went out but no listener with that id answered
    #[error("Extension not reachable: {0}")]
    Unreachable(String),

    #[error("Extension runtime error: {0}")]
    Runtime(String),
}

/// The browser capabilities the handoff page relies on
#[async_trait]
pub trait ExtensionHost: Send + Sync + 'static {
    /// Whether this page can message `extension_id` directly at all
    fn can_message_directly(&self, extension_id: &str) -> bool;

    async fn send_message(
        &self,
        extension_id: &str,
        envelope: &Envelope,
    ) -> Result<DirectReply, MessagingError>;

    /// Same-page broadcast with no acknowledgment
    fn post_broadcast(&self, envelope: &Envelope);

    fn close_tab(&self);
}

/// Result of one attempt on the direct channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectOutcome {
    Acknowledged,
    /// The extension answered without confirming
    Rejected,
    Failed(MessagingError),
    TimedOut,
    /// No extension id, or the host cannot message extensions
    Unavailable,
}

impl DirectOutcome {
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, DirectOutcome::Acknowledged)
    }
}

pub(crate) async fn send_direct(
    host: &dyn ExtensionHost,
    extension_id: Option<&str>,
    envelope: &Envelope,
    timeout: Duration,
) -> DirectOutcome {
    let Some(extension_id) = extension_id.filter(|id| !id.is_empty()) else {
        return DirectOutcome::Unavailable;
    };
    if !host.can_message_directly(extension_id) {
        return DirectOutcome::Unavailable;
    }

    match tokio::time::timeout(timeout, host.send_message(extension_id, envelope)).await {
        Ok(Ok(reply)) if reply.success == Some(true) => DirectOutcome::Acknowledged,
        Ok(Ok(_)) => DirectOutcome::Rejected,
        Ok(Err(e)) => DirectOutcome::Failed(e),
        Err(_) => DirectOutcome::TimedOut,
    }
}
