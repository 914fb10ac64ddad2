use async_trait::async_trait;
use chrono::{Duration, Utc};
use url::Url;

use super::gotrue::{GoTrueClient, ProviderSession};
use crate::session::{
    AuthError, CodeExchange, CookieAuthBackend, CookieOptions, CookieToSet, RequestCookies,
    UserLookup,
};
use crate::utils::{UtilError, base64url_decode, base64url_encode};

const BASE64_PREFIX: &str = "base64-";
// Browsers cap a single cookie around 4KB; leave room for the attributes
const MAX_CHUNK_SIZE: usize = 3180;
// Refresh a little before the provider would reject the token
const EXPIRY_MARGIN_SECS: i64 = 10;
const SESSION_MAX_AGE_SECS: i64 = 400 * 24 * 60 * 60;

/// `sb-<project-ref>-auth-token`, where the ref is the provider host's first label
pub fn storage_key(provider_url: &str) -> Result<String, AuthError> {
    let url = Url::parse(provider_url)
        .map_err(|e| AuthError::Cookie(format!("Bad provider URL: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| AuthError::Cookie("Provider URL has no host".to_string()))?;
    let project_ref = host.split('.').next().unwrap_or(host);
    Ok(format!("sb-{project_ref}-auth-token"))
}

pub(crate) fn encode_cookie_value(session: &ProviderSession) -> Result<String, AuthError> {
    let json = serde_json::to_vec(session)
        .map_err(|e| AuthError::Cookie(format!("Failed to serialize session: {e}")))?;
    Ok(format!("{BASE64_PREFIX}{}", base64url_encode(&json)))
}

pub(crate) fn decode_cookie_value(value: &str) -> Result<ProviderSession, AuthError> {
    let json = decode_raw(value)?;
    serde_json::from_slice(&json)
        .map_err(|e| AuthError::Cookie(format!("Malformed session cookie: {e}")))
}

fn decode_raw(value: &str) -> Result<Vec<u8>, UtilError> {
    match value.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => base64url_decode(encoded),
        None => Ok(value.as_bytes().to_vec()),
    }
}

/// Session cookies backed by the provider's REST API.
///
/// The cookie only says which session the browser claims to hold; every
/// lookup is confirmed with the provider.
pub struct SupabaseCookieBackend {
    client: GoTrueClient,
    storage_key: String,
    cookie_options: CookieOptions,
}

impl SupabaseCookieBackend {
    pub fn new(client: GoTrueClient) -> Result<Self, AuthError> {
        let storage_key = storage_key(client.base_url())?;
        Ok(Self {
            client,
            storage_key,
            cookie_options: CookieOptions {
                path: "/".to_string(),
                max_age: Some(SESSION_MAX_AGE_SECS),
                // The browser-side client reads the same cookie
                http_only: false,
                ..CookieOptions::default()
            },
        })
    }

    pub fn from_env() -> Result<Self, AuthError> {
        Self::new(GoTrueClient::from_env()?)
    }

    pub fn with_cookie_options(mut self, options: CookieOptions) -> Self {
        self.cookie_options = options;
        self
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    fn verifier_key(&self) -> String {
        format!("{}-code-verifier", self.storage_key)
    }

    fn chunk_name(&self, index: usize) -> String {
        format!("{}.{index}", self.storage_key)
    }

    /// Whole cookie first, then `.0`, `.1`, ... concatenated
    fn read_session_value(&self, cookies: &RequestCookies) -> Option<String> {
        if let Some(value) = cookies.get(&self.storage_key) {
            return Some(value.to_string());
        }
        let mut joined = String::new();
        for index in 0.. {
            match cookies.get(&self.chunk_name(index)) {
                Some(chunk) => joined.push_str(chunk),
                None => break,
            }
        }
        (!joined.is_empty()).then_some(joined)
    }

    fn read_session(&self, cookies: &RequestCookies) -> Option<ProviderSession> {
        let value = self.read_session_value(cookies)?;
        match decode_cookie_value(&value) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable session cookie");
                None
            }
        }
    }

    fn write_session(
        &self,
        cookies: &RequestCookies,
        session: &ProviderSession,
    ) -> Result<Vec<CookieToSet>, AuthError> {
        let value = encode_cookie_value(session)?;
        let mut out = Vec::new();

        if value.len() <= MAX_CHUNK_SIZE {
            out.push(CookieToSet::new(
                self.storage_key.clone(),
                value,
                self.cookie_options.clone(),
            ));
            out.extend(self.stale_chunks(cookies, 0));
            return Ok(out);
        }

        // The encoded value is ASCII, so byte chunks are valid strings
        let chunks: Vec<&str> = value
            .as_bytes()
            .chunks(MAX_CHUNK_SIZE)
            .map(|c| std::str::from_utf8(c).unwrap_or_default())
            .collect();
        for (index, chunk) in chunks.iter().enumerate() {
            out.push(CookieToSet::new(
                self.chunk_name(index),
                *chunk,
                self.cookie_options.clone(),
            ));
        }
        out.extend(self.stale_chunks(cookies, chunks.len()));
        if cookies.get(&self.storage_key).is_some() {
            out.push(self.removal(self.storage_key.clone()));
        }
        Ok(out)
    }

    fn clear_session(&self, cookies: &RequestCookies) -> Vec<CookieToSet> {
        let mut out = Vec::new();
        if cookies.get(&self.storage_key).is_some() {
            out.push(self.removal(self.storage_key.clone()));
        }
        out.extend(self.stale_chunks(cookies, 0));
        out
    }

    // Removals for `.from`, `.from+1`, ... that the request still carries
    fn stale_chunks(&self, cookies: &RequestCookies, from: usize) -> Vec<CookieToSet> {
        (from..)
            .map(|index| self.chunk_name(index))
            .take_while(|name| cookies.get(name).is_some())
            .map(|name| self.removal(name))
            .collect()
    }

    fn removal(&self, name: String) -> CookieToSet {
        let mut cookie = CookieToSet::removal(name);
        cookie.options.path = self.cookie_options.path.clone();
        cookie
    }

    fn code_verifier(&self, cookies: &RequestCookies) -> Option<String> {
        let raw = cookies.get(&self.verifier_key())?;
        let bytes = decode_raw(raw).ok()?;
        let text = String::from_utf8(bytes).ok()?;
        // Stored as a JSON string, optionally suffixed with `/<redirect type>`
        let text = serde_json::from_str::<String>(&text).unwrap_or(text);
        let verifier = text.split('/').next().unwrap_or_default();
        (!verifier.is_empty()).then(|| verifier.to_string())
    }
}

#[async_trait]
impl CookieAuthBackend for SupabaseCookieBackend {
    async fn get_user(&self, cookies: &RequestCookies) -> Result<UserLookup, AuthError> {
        let Some(mut session) = self.read_session(cookies) else {
            return Ok(UserLookup::default());
        };
        let mut cookies_to_set = Vec::new();

        let expiring = session
            .to_session()
            .expires_within(Utc::now(), Duration::seconds(EXPIRY_MARGIN_SECS));
        if expiring {
            match self.client.refresh(&session.refresh_token).await {
                Ok(refreshed) => {
                    tracing::debug!("Rotated expiring session cookie");
                    cookies_to_set = self.write_session(cookies, &refreshed)?;
                    session = refreshed;
                }
                Err(e) if e.is_unauthorized() || matches!(e, AuthError::Provider { status: 400, .. }) => {
                    tracing::info!(error = %e, "Refresh token rejected, clearing session cookie");
                    return Ok(UserLookup {
                        user: None,
                        cookies_to_set: self.clear_session(cookies),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        match self.client.get_user(&session.access_token).await {
            Ok(user) => Ok(UserLookup {
                user: Some(user.into()),
                cookies_to_set,
            }),
            Err(e) if e.is_unauthorized() => {
                tracing::debug!("Provider rejected access token");
                Ok(UserLookup {
                    user: None,
                    cookies_to_set,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn exchange_code_for_session(
        &self,
        cookies: &RequestCookies,
        code: &str,
    ) -> Result<CodeExchange, AuthError> {
        let verifier = self
            .code_verifier(cookies)
            .ok_or(AuthError::MissingCodeVerifier)?;
        let session = self.client.exchange_pkce(code, &verifier).await?;

        let mut cookies_to_set = self.write_session(cookies, &session)?;
        cookies_to_set.push(self.removal(self.verifier_key()));

        Ok(CodeExchange {
            session: session.to_session(),
            cookies_to_set,
        })
    }
}
