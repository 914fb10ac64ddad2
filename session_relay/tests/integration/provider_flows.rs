use std::sync::Arc;
use std::sync::atomic::Ordering;

use session_relay::{
    AuthError, CookieAuthBackend, GoTrueClient, ProviderSession, RequestCookies,
    ServerAuthClient, SessionProvider, SupabaseBrowserClient, SupabaseCookieBackend,
};

use crate::common::MockProvider;
use crate::common::mock_provider::{
    ANON_KEY, AUTH_CODE, CODE_VERIFIER, FRESH_ACCESS, GOOD_REFRESH, VALID_ACCESS, cookie_value,
    decode_cookie_value, session_json,
};

const COOKIE: &str = "sb-localhost-auth-token";

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn backend(provider: &MockProvider) -> SupabaseCookieBackend {
    let client = GoTrueClient::new(&provider.base_url, ANON_KEY).expect("client");
    SupabaseCookieBackend::new(client).expect("backend")
}

fn cookies_with(access: &str, refresh: &str, expires_at: i64) -> RequestCookies {
    [(COOKIE, cookie_value(&session_json(access, refresh, expires_at)))]
        .into_iter()
        .collect()
}

#[tokio::test]
async fn test_valid_cookie_yields_user_without_rotation() {
    let provider = MockProvider::start().await;
    let backend = backend(&provider);
    assert_eq!(backend.storage_key(), COOKIE);

    let lookup = backend
        .get_user(&cookies_with(VALID_ACCESS, GOOD_REFRESH, now() + 3600))
        .await
        .unwrap();

    assert_eq!(lookup.user.map(|u| u.id), Some("user-1".to_string()));
    assert!(lookup.cookies_to_set.is_empty());
    assert_eq!(provider.state.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_expired_cookie_is_refreshed_and_rotated() {
    let provider = MockProvider::start().await;
    let backend = backend(&provider);

    let lookup = backend
        .get_user(&cookies_with("stale-access", GOOD_REFRESH, now() - 60))
        .await
        .unwrap();

    assert!(lookup.user.is_some());
    assert_eq!(provider.state.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(lookup.cookies_to_set.len(), 1);
    let rotated = &lookup.cookies_to_set[0];
    assert_eq!(rotated.name, COOKIE);
    assert_eq!(
        decode_cookie_value(&rotated.value)["access_token"],
        FRESH_ACCESS
    );
}

#[tokio::test]
async fn test_rejected_refresh_clears_cookie() {
    let provider = MockProvider::start().await;
    let backend = backend(&provider);

    let lookup = backend
        .get_user(&cookies_with("stale-access", "revoked-refresh", now() - 60))
        .await
        .unwrap();

    assert!(lookup.user.is_none());
    assert_eq!(lookup.cookies_to_set.len(), 1);
    assert!(lookup.cookies_to_set[0].is_removal());
}

#[tokio::test]
async fn test_tampered_access_token_is_anonymous() {
    let provider = MockProvider::start().await;
    let backend = backend(&provider);

    let lookup = backend
        .get_user(&cookies_with("forged", GOOD_REFRESH, now() + 3600))
        .await
        .unwrap();

    assert!(lookup.user.is_none());
}

#[tokio::test]
async fn test_unreachable_provider_fails_closed() {
    let client = GoTrueClient::new("http://127.0.0.1:9", ANON_KEY).unwrap();
    let backend: Arc<dyn CookieAuthBackend> =
        Arc::new(SupabaseCookieBackend::new(client).unwrap());
    let cookies: RequestCookies = [(
        "sb-127-auth-token",
        cookie_value(&session_json(VALID_ACCESS, GOOD_REFRESH, now() + 3600)),
    )]
    .into_iter()
    .collect();

    assert!(matches!(
        backend.get_user(&cookies).await,
        Err(AuthError::Network(_))
    ));
    let mut server_client = ServerAuthClient::new(backend, cookies);
    assert!(server_client.current_user().await.is_none());
}

#[tokio::test]
async fn test_code_exchange_sets_session_and_drops_verifier() {
    let provider = MockProvider::start().await;
    let mut client = ServerAuthClient::new(
        Arc::new(backend(&provider)),
        [(
            "sb-localhost-auth-token-code-verifier",
            format!("\"{CODE_VERIFIER}\""),
        )]
        .into_iter()
        .collect(),
    );

    let session = client.exchange_code_for_session(AUTH_CODE).await.unwrap();
    assert_eq!(session.user_id, "user-1");
    assert_eq!(session.access_token, VALID_ACCESS);

    // The new session is visible to the rest of the same request
    let user = client.get_user().await.unwrap();
    assert_eq!(user.map(|u| u.id), Some("user-1".to_string()));

    let cookies = client.take_cookies();
    let session_cookie = cookies.iter().find(|c| c.name == COOKIE).unwrap();
    assert!(!session_cookie.is_removal());
    let verifier = cookies
        .iter()
        .find(|c| c.name == "sb-localhost-auth-token-code-verifier")
        .unwrap();
    assert!(verifier.is_removal());
}

#[tokio::test]
async fn test_code_exchange_with_wrong_verifier_is_rejected() {
    let provider = MockProvider::start().await;
    let backend = backend(&provider);
    let cookies: RequestCookies = [("sb-localhost-auth-token-code-verifier", "\"wrong\"")]
        .into_iter()
        .collect();

    let err = backend
        .exchange_code_for_session(&cookies, AUTH_CODE)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Provider { status: 400, .. }));
}

#[tokio::test]
async fn test_browser_client_refresh_and_sign_out() {
    let provider = MockProvider::start().await;
    let client = SupabaseBrowserClient::new(GoTrueClient::new(&provider.base_url, ANON_KEY).unwrap());
    let initial: ProviderSession =
        serde_json::from_value(session_json(VALID_ACCESS, GOOD_REFRESH, now() + 3600)).unwrap();
    client.set_session(initial).await;

    let refreshed = client.refresh_session().await.unwrap().unwrap();
    assert_eq!(refreshed.access_token, FRESH_ACCESS);
    assert_eq!(
        client.get_session().await.unwrap().map(|s| s.access_token),
        Some(FRESH_ACCESS.to_string())
    );

    client.sign_out().await.unwrap();
    assert!(client.get_session().await.unwrap().is_none());
    assert_eq!(provider.state.logout_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        provider.state.last_logout_token.lock().unwrap().as_deref(),
        Some(FRESH_ACCESS)
    );
}

#[tokio::test]
async fn test_browser_client_auto_refreshes_expired_session() {
    let provider = MockProvider::start().await;
    let client = SupabaseBrowserClient::new(GoTrueClient::new(&provider.base_url, ANON_KEY).unwrap());
    let expired: ProviderSession =
        serde_json::from_value(session_json("stale", GOOD_REFRESH, now() - 60)).unwrap();
    client.set_session(expired).await;

    let session = client.get_session().await.unwrap().unwrap();
    assert_eq!(session.access_token, FRESH_ACCESS);
}

#[tokio::test]
async fn test_browser_client_drops_session_on_rejected_refresh() {
    let provider = MockProvider::start().await;
    let client = SupabaseBrowserClient::new(GoTrueClient::new(&provider.base_url, ANON_KEY).unwrap());
    let session: ProviderSession =
        serde_json::from_value(session_json(VALID_ACCESS, "revoked", now() + 3600)).unwrap();
    client.set_session(session).await;

    assert!(client.refresh_session().await.is_err());
    assert!(client.get_session().await.unwrap().is_none());
}
