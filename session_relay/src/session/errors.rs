use thiserror::Error;

use crate::utils::UtilError;

/// Failures reported by, or while talking to, the identity provider
#[derive(Debug, Error, Clone)]
pub enum AuthError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider rejected request ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("No session to refresh")]
    NoSession,

    #[error("Code verifier cookie missing")]
    MissingCodeVerifier,

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl AuthError {
    /// Whether the provider said the credentials themselves are no good
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AuthError::Provider { status, .. } if *status == 401 || *status == 403)
    }
}
