//! Shared fakes for unit tests across the crate

pub(crate) mod mocks {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use http::StatusCode;
    use tokio::time::Instant;

    use crate::handoff::{DirectReply, Envelope, ExtensionHost, MessagingError};
    use crate::interceptor::{ApiError, ApiRequest, ApiResponse, HttpTransport};
    use crate::navigation::Navigator;
    use crate::session::{
        AuthError, CodeExchange, CookieAuthBackend, CookieToSet, RequestCookies, Session,
        SessionProvider, User, UserLookup,
    };

    // Crate-wide ordering of observable side effects
    static SEQUENCE: AtomicU64 = AtomicU64::new(1);

    fn next_seq() -> u64 {
        SEQUENCE.fetch_add(1, Ordering::SeqCst)
    }

    pub(crate) fn session(access_token: &str) -> Session {
        Session {
            user_id: "u1".to_string(),
            access_token: access_token.to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: None,
        }
    }

    pub(crate) struct MockCookieBackend {
        user: Option<User>,
        fail: bool,
        rotation: Vec<CookieToSet>,
    }

    impl MockCookieBackend {
        pub(crate) fn authenticated(id: &str) -> Self {
            Self {
                user: Some(User {
                    id: id.to_string(),
                    email: None,
                }),
                fail: false,
                rotation: Vec::new(),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                user: None,
                fail: true,
                rotation: Vec::new(),
            }
        }

        pub(crate) fn with_rotation(mut self, cookie: CookieToSet) -> Self {
            self.rotation.push(cookie);
            self
        }
    }

    #[async_trait]
    impl CookieAuthBackend for MockCookieBackend {
        async fn get_user(&self, _cookies: &RequestCookies) -> Result<UserLookup, AuthError> {
            if self.fail {
                return Err(AuthError::Network("connection refused".to_string()));
            }
            Ok(UserLookup {
                user: self.user.clone(),
                cookies_to_set: self.rotation.clone(),
            })
        }

        async fn exchange_code_for_session(
            &self,
            _cookies: &RequestCookies,
            code: &str,
        ) -> Result<CodeExchange, AuthError> {
            if self.fail {
                return Err(AuthError::Network("connection refused".to_string()));
            }
            Ok(CodeExchange {
                session: session(&format!("from-{code}")),
                cookies_to_set: self.rotation.clone(),
            })
        }
    }

    enum RefreshBehavior {
        Nothing,
        To(Session),
        Fail,
    }

    pub(crate) struct MockSessionProvider {
        current: Mutex<Option<Session>>,
        refresh: RefreshBehavior,
        refresh_calls: AtomicUsize,
        sign_out_calls: AtomicUsize,
        signed_out_at: Mutex<Option<u64>>,
    }

    impl MockSessionProvider {
        fn build(current: Option<Session>) -> Self {
            Self {
                current: Mutex::new(current),
                refresh: RefreshBehavior::Nothing,
                refresh_calls: AtomicUsize::new(0),
                sign_out_calls: AtomicUsize::new(0),
                signed_out_at: Mutex::new(None),
            }
        }

        pub(crate) fn with_session(session: Session) -> Self {
            Self::build(Some(session))
        }

        pub(crate) fn signed_out() -> Self {
            Self::build(None)
        }

        pub(crate) fn refreshing_to(mut self, session: Session) -> Self {
            self.refresh = RefreshBehavior::To(session);
            self
        }

        pub(crate) fn failing_refresh(mut self) -> Self {
            self.refresh = RefreshBehavior::Fail;
            self
        }

        pub(crate) fn refresh_calls(&self) -> usize {
            self.refresh_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn sign_out_calls(&self) -> usize {
            self.sign_out_calls.load(Ordering::SeqCst)
        }

        /// True when sign-out happened and preceded the side effect stamped `other`
        pub(crate) fn signed_out_before(&self, other: Option<u64>) -> bool {
            match (*self.signed_out_at.lock().unwrap(), other) {
                (Some(signed_out), Some(other)) => signed_out < other,
                _ => false,
            }
        }
    }

    #[async_trait]
    impl SessionProvider for MockSessionProvider {
        async fn get_session(&self) -> Result<Option<Session>, AuthError> {
            Ok(self.current.lock().unwrap().clone())
        }

        async fn refresh_session(&self) -> Result<Option<Session>, AuthError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            match &self.refresh {
                RefreshBehavior::Nothing => Ok(None),
                RefreshBehavior::To(session) => {
                    *self.current.lock().unwrap() = Some(session.clone());
                    Ok(Some(session.clone()))
                }
                RefreshBehavior::Fail => Err(AuthError::Provider {
                    status: 401,
                    message: "refresh token revoked".to_string(),
                }),
            }
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
            *self.signed_out_at.lock().unwrap() = Some(next_seq());
            self.current.lock().unwrap().take();
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingNavigator {
        navigations: Mutex<Vec<(u64, String)>>,
        replacements: Mutex<Vec<String>>,
    }

    impl RecordingNavigator {
        pub(crate) fn navigations(&self) -> Vec<String> {
            self.navigations
                .lock()
                .unwrap()
                .iter()
                .map(|(_, url)| url.clone())
                .collect()
        }

        pub(crate) fn first_navigation_at(&self) -> Option<u64> {
            self.navigations.lock().unwrap().first().map(|(seq, _)| *seq)
        }

        pub(crate) fn replacements(&self) -> Vec<String> {
            self.replacements.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, url: &str) {
            self.navigations
                .lock()
                .unwrap()
                .push((next_seq(), url.to_string()));
        }

        fn replace(&self, url: &str) {
            self.replacements.lock().unwrap().push(url.to_string());
        }
    }

    /// Answers with a fixed script of statuses; the last entry repeats
    pub(crate) struct ScriptedTransport {
        statuses: Vec<StatusCode>,
        body: String,
        delay: Option<Duration>,
        seen: Mutex<Vec<(String, Option<String>)>>,
    }

    impl ScriptedTransport {
        pub(crate) fn always(status: StatusCode) -> Self {
            Self::sequence([status])
        }

        pub(crate) fn sequence<I: IntoIterator<Item = StatusCode>>(statuses: I) -> Self {
            Self {
                statuses: statuses.into_iter().collect(),
                body: String::new(),
                delay: None,
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn always_with_body(status: StatusCode, body: &str) -> Self {
            Self {
                body: body.to_string(),
                ..Self::always(status)
            }
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub(crate) fn seen_tokens(&self) -> Vec<Option<String>> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|(_, token)| token.clone())
                .collect()
        }

        pub(crate) fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        pub(crate) fn calls_for(&self, path: &str) -> usize {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .filter(|(p, _)| p == path)
                .count()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let index = {
                let mut seen = self.seen.lock().unwrap();
                seen.push((request.path.clone(), request.bearer().map(str::to_string)));
                seen.len() - 1
            };
            let status = self
                .statuses
                .get(index)
                .or(self.statuses.last())
                .copied()
                .unwrap_or(StatusCode::OK);
            Ok(ApiResponse::new(status, self.body.clone()))
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum DirectBehavior {
        Acknowledge,
        NoCapability,
        /// Replies, but without `success: true`
        ReplyWithout,
        Error,
        /// Never replies
        Hang,
    }

    pub(crate) struct MockExtensionHost {
        behavior: DirectBehavior,
        direct: Mutex<Vec<(String, Envelope)>>,
        broadcasts: Mutex<Vec<(Instant, Envelope)>>,
        closes: AtomicUsize,
    }

    impl MockExtensionHost {
        pub(crate) fn new(behavior: DirectBehavior) -> Self {
            Self {
                behavior,
                direct: Mutex::new(Vec::new()),
                broadcasts: Mutex::new(Vec::new()),
                closes: AtomicUsize::new(0),
            }
        }

        pub(crate) fn direct_sends(&self) -> usize {
            self.direct.lock().unwrap().len()
        }

        pub(crate) fn last_direct(&self) -> Option<(String, Envelope)> {
            self.direct.lock().unwrap().last().cloned()
        }

        pub(crate) fn broadcasts(&self) -> Vec<(Instant, Envelope)> {
            self.broadcasts.lock().unwrap().clone()
        }

        pub(crate) fn close_calls(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExtensionHost for MockExtensionHost {
        fn can_message_directly(&self, _extension_id: &str) -> bool {
            self.behavior != DirectBehavior::NoCapability
        }

        async fn send_message(
            &self,
            extension_id: &str,
            envelope: &Envelope,
        ) -> Result<DirectReply, MessagingError> {
            self.direct
                .lock()
                .unwrap()
                .push((extension_id.to_string(), envelope.clone()));
            match self.behavior {
                DirectBehavior::Acknowledge => Ok(DirectReply::ok()),
                DirectBehavior::ReplyWithout | DirectBehavior::NoCapability => {
                    Ok(DirectReply::default())
                }
                DirectBehavior::Error => Err(MessagingError::Unreachable(
                    "Could not establish connection".to_string(),
                )),
                DirectBehavior::Hang => std::future::pending().await,
            }
        }

        fn post_broadcast(&self, envelope: &Envelope) {
            self.broadcasts
                .lock()
                .unwrap()
                .push((Instant::now(), envelope.clone()));
        }

        fn close_tab(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}
