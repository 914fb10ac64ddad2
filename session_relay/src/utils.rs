use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use http::header::{HeaderMap, HeaderValue, SET_COOKIE};
use thiserror::Error;

pub(crate) fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    // Tolerate padded input; some producers emit it even for URL-safe payloads
    let decoded = URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .map_err(|_| UtilError::Format("Failed to decode base64url".to_string()))?;
    Ok(decoded)
}

pub(crate) fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Append one `Set-Cookie` header per serialized cookie
pub fn append_set_cookies<'a, I>(headers: &mut HeaderMap, cookies: I) -> Result<(), UtilError>
where
    I: IntoIterator<Item = &'a str>,
{
    for cookie in cookies {
        let value = HeaderValue::from_str(cookie)
            .map_err(|_| UtilError::Cookie("Failed to parse cookie".to_string()))?;
        headers.append(SET_COOKIE, value);
    }
    Ok(())
}

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Invalid format: {0}")]
    Format(String),
}
