use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    /// The API answered with a non-success status
    #[error("Request failed with status {status}")]
    Status { status: StatusCode, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Serde error: {0}")]
    Serde(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}
