use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ReceiverError {
    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
