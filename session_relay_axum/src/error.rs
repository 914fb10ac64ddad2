use http::{Result as HttpResponse, StatusCode};
use session_relay::AuthError;

/// Helper trait for converting errors to a standard response error format
pub(super) trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

/// Provider failures: bad credentials are the caller's problem, an
/// unreachable or confused provider is ours
impl<T> IntoResponseError<T> for Result<T, AuthError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            let status = match &e {
                e if e.is_unauthorized() => StatusCode::UNAUTHORIZED,
                AuthError::NoSession => StatusCode::UNAUTHORIZED,
                AuthError::Cookie(_) | AuthError::MissingCodeVerifier => StatusCode::BAD_REQUEST,
                AuthError::Provider { status, .. } if *status >= 500 => StatusCode::BAD_GATEWAY,
                AuthError::Provider { .. } => StatusCode::BAD_REQUEST,
                AuthError::Network(_) | AuthError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
                AuthError::Utils(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, e.to_string())
        })
    }
}

/// Implementation for http::Error (used by Response::builder())
impl<T> IntoResponseError<T> for HttpResponse<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }
}
