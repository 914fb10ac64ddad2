mod client;
mod errors;
mod transport;

pub use client::ApiClient;
pub use errors::ApiError;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
