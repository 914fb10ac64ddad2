use std::fmt;

use serde::{Deserialize, Serialize};

/// The unit moved from the web page into the extension
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffMessage {
    pub token: String,
}

impl HandoffMessage {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for HandoffMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandoffMessage")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Channel-specific wrapping of a [`HandoffMessage`].
///
/// Both variants carry the same payload; only the `type` tag differs so the
/// extension can tell a direct delivery from a relayed page broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    #[serde(rename = "SET_TOKEN")]
    Direct(HandoffMessage),
    #[serde(rename = "NOD_AUTH_TOKEN")]
    Broadcast(HandoffMessage),
}
