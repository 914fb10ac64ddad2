use serde::{Deserialize, Serialize};

use crate::utils::base64url_decode;

/// Display-only identity pulled out of an access token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub email: String,
    pub name: String,
    pub avatar_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct Claims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    email: Option<String>,
    full_name: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
    picture: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Decode the JWT payload without checking the signature.
///
/// Returns `None` for anything that is not a three-part token with a JSON
/// payload. The result must never be used for authorization.
pub fn decode_user_info(token: &str) -> Option<UserInfo> {
    let mut parts = token.split('.');
    let (Some(_), Some(payload), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let bytes = base64url_decode(payload).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    let meta = claims.user_metadata;

    let email = non_empty(claims.email)
        .or(non_empty(meta.email))
        .unwrap_or_default();
    let name = non_empty(meta.full_name)
        .or(non_empty(meta.name))
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    let avatar_url = non_empty(meta.avatar_url)
        .or(non_empty(meta.picture))
        .unwrap_or_default();

    Some(UserInfo {
        email,
        name,
        avatar_url,
    })
}

#[cfg(test)]
pub(crate) fn fake_jwt(payload: &serde_json::Value) -> String {
    use crate::utils::base64url_encode;
    format!(
        "{}.{}.sig",
        base64url_encode(br#"{"alg":"HS256","typ":"JWT"}"#),
        base64url_encode(payload.to_string().as_bytes())
    )
}
