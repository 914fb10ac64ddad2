//! First-run gate in front of authenticated pages

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::RELAY_ONBOARDING_PATH;
use crate::interceptor::ApiClient;
use crate::locale::{LocalizedPath, localize};
use crate::navigation::Navigator;

pub(crate) const USER_ME_PATH: &str = "/api/users/me";

/// The slice of `/api/users/me` the gate cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OnboardingStatus {
    #[serde(default)]
    pub onboarding_completed_at: Option<DateTime<Utc>>,
}

impl OnboardingStatus {
    pub fn is_completed(&self) -> bool {
        self.onboarding_completed_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Status unknown, or a redirect to onboarding is underway
    Checking,
    Allowed,
}

pub struct OnboardingGate {
    api: ApiClient,
    navigator: Arc<dyn Navigator>,
    /// Locale-free path the last redirect was issued for
    redirected_from: Mutex<Option<String>>,
}

impl OnboardingGate {
    pub fn new(api: ApiClient, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            navigator,
            redirected_from: Mutex::new(None),
        }
    }

    /// Decide whether the page at `pathname` may render.
    ///
    /// The status is fetched on every call. Any failure lets the page through.
    /// Dropping the returned future before it resolves leaves no trace.
    pub async fn check(&self, pathname: &str) -> GateState {
        let status = match self.api.get_json::<OnboardingStatus>(USER_ME_PATH).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(error = %e, "Onboarding status check failed, allowing page");
                return GateState::Allowed;
            }
        };

        let localized = LocalizedPath::parse(pathname);
        let mut redirected_from = self
            .redirected_from
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if status.is_completed() || localized.path_without_locale == *RELAY_ONBOARDING_PATH {
            redirected_from.take();
            return GateState::Allowed;
        }

        // One redirect per visited path; a new path re-arms the gate
        if redirected_from.as_deref() != Some(localized.path_without_locale.as_str()) {
            *redirected_from = Some(localized.path_without_locale.clone());
            let target = localize(RELAY_ONBOARDING_PATH.as_str(), localized.locale);
            tracing::info!(%target, "Onboarding not completed, redirecting");
            self.navigator.replace(&target);
        }
        GateState::Checking
    }
}
