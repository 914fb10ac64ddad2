use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::host::{DirectOutcome, ExtensionHost, send_direct};
use super::message::{Envelope, HandoffMessage};
use super::scheduler::{RetryState, ScheduledTask};
use crate::config::{
    RELAY_HANDOFF_CLOSE_COUNTDOWN_SECS, RELAY_HANDOFF_DIRECT_TIMEOUT_MS,
    RELAY_HANDOFF_INTERVAL_MS, RELAY_HANDOFF_MAX_ATTEMPTS,
};
use crate::session::SessionProvider;

/// Query parameter carrying the requesting extension's id
pub const EXTENSION_ID_PARAM: &str = "ext";

/// User-visible handoff state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffStatus {
    Loading,
    Success,
    /// No session to hand off; terminal
    Error,
}

/// How the token actually left the page. Not shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Pending,
    Acknowledged,
    /// Broadcast budget spent with no way to observe receipt
    Unconfirmed { broadcasts: u32 },
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffView {
    pub status: HandoffStatus,
    pub delivery: Delivery,
    pub broadcasts_sent: u32,
    /// Seconds left before the tab closes itself, once successful
    pub countdown: Option<u32>,
}

impl Default for HandoffView {
    fn default() -> Self {
        Self {
            status: HandoffStatus::Loading,
            delivery: Delivery::Pending,
            broadcasts_sent: 0,
            countdown: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffSettings {
    pub max_attempts: u32,
    pub interval: Duration,
    pub direct_timeout: Duration,
    pub close_countdown_secs: u32,
}

impl Default for HandoffSettings {
    fn default() -> Self {
        Self {
            max_attempts: *RELAY_HANDOFF_MAX_ATTEMPTS,
            interval: Duration::from_millis(*RELAY_HANDOFF_INTERVAL_MS),
            direct_timeout: Duration::from_millis(*RELAY_HANDOFF_DIRECT_TIMEOUT_MS),
            close_countdown_secs: *RELAY_HANDOFF_CLOSE_COUNTDOWN_SECS,
        }
    }
}

/// Pull the extension id out of a raw query string (`ext=<id>&...`)
pub fn extension_id_from_query(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(key, _)| key == EXTENSION_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Moves the current session token from this page into the extension
#[derive(Clone)]
pub struct HandoffProtocol {
    provider: Arc<dyn SessionProvider>,
    host: Arc<dyn ExtensionHost>,
    settings: HandoffSettings,
}

impl HandoffProtocol {
    pub fn new(provider: Arc<dyn SessionProvider>, host: Arc<dyn ExtensionHost>) -> Self {
        Self::with_settings(provider, host, HandoffSettings::default())
    }

    pub fn with_settings(
        provider: Arc<dyn SessionProvider>,
        host: Arc<dyn ExtensionHost>,
        settings: HandoffSettings,
    ) -> Self {
        Self {
            provider,
            host,
            settings,
        }
    }

    /// Start the handoff in the background. Tearing down the returned
    /// session stops every pending broadcast, the countdown and the close.
    pub fn start(&self, extension_id: Option<String>) -> HandoffSession {
        let (tx, rx) = watch::channel(HandoffView::default());
        let protocol = self.clone();
        let task = ScheduledTask::spawn(async move {
            protocol.run(extension_id.as_deref(), &tx).await;
        });
        HandoffSession { task, view: rx }
    }

    pub fn start_from_query(&self, query: &str) -> HandoffSession {
        self.start(extension_id_from_query(query))
    }

    async fn run(&self, extension_id: Option<&str>, view: &watch::Sender<HandoffView>) {
        let Some(token) = self.current_token().await else {
            tracing::info!("No session to hand off to the extension");
            view.send_modify(|v| {
                v.status = HandoffStatus::Error;
                v.delivery = Delivery::NotAttempted;
            });
            return;
        };

        let message = HandoffMessage::new(token);
        let outcome = send_direct(
            self.host.as_ref(),
            extension_id,
            &Envelope::Direct(message.clone()),
            self.settings.direct_timeout,
        )
        .await;

        let delivery = if outcome.is_acknowledged() {
            tracing::info!("Extension acknowledged token on direct channel");
            Delivery::Acknowledged
        } else {
            log_fallback(&outcome);
            let broadcasts = self.broadcast_until_exhausted(message, view).await;
            tracing::warn!(
                broadcasts,
                "Broadcast budget exhausted without acknowledgment, assuming delivery"
            );
            Delivery::Unconfirmed { broadcasts }
        };

        view.send_modify(|v| {
            v.status = HandoffStatus::Success;
            v.delivery = delivery;
        });

        self.count_down_and_close(view).await;
    }

    async fn current_token(&self) -> Option<String> {
        match self.provider.get_session().await {
            Ok(session) => session.map(|s| s.access_token),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session for handoff");
                None
            }
        }
    }

    // Each post is scheduled only after the previous one went out, so attempts never overlap
    async fn broadcast_until_exhausted(
        &self,
        message: HandoffMessage,
        view: &watch::Sender<HandoffView>,
    ) -> u32 {
        let envelope = Envelope::Broadcast(message);
        let mut retry = RetryState::new(self.settings.max_attempts, self.settings.interval);

        while !retry.is_exhausted() {
            tokio::time::sleep(retry.interval()).await;
            self.host.post_broadcast(&envelope);
            retry.record_attempt();
            let sent = retry.attempts();
            tracing::debug!(attempt = sent, max = retry.max_attempts(), "Posted token broadcast");
            view.send_modify(|v| v.broadcasts_sent = sent);
        }

        retry.attempts()
    }

    async fn count_down_and_close(&self, view: &watch::Sender<HandoffView>) {
        for remaining in (1..=self.settings.close_countdown_secs).rev() {
            view.send_modify(|v| v.countdown = Some(remaining));
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        view.send_modify(|v| v.countdown = Some(0));
        tracing::debug!("Closing handoff tab");
        self.host.close_tab();
    }
}

fn log_fallback(outcome: &DirectOutcome) {
    match outcome {
        DirectOutcome::Unavailable => {
            tracing::debug!("Direct extension messaging unavailable, using broadcast")
        }
        DirectOutcome::Rejected => {
            tracing::info!("Extension did not confirm token, using broadcast")
        }
        DirectOutcome::Failed(e) => {
            tracing::info!(error = %e, "Direct extension messaging failed, using broadcast")
        }
        DirectOutcome::TimedOut => {
            tracing::info!("Direct extension messaging timed out, using broadcast")
        }
        DirectOutcome::Acknowledged => {}
    }
}

/// A running handoff, owned by whatever hosts the page
pub struct HandoffSession {
    task: ScheduledTask,
    view: watch::Receiver<HandoffView>,
}

impl HandoffSession {
    pub fn view(&self) -> HandoffView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HandoffView> {
        self.view.clone()
    }

    /// Wait until the status leaves `Loading`
    pub async fn settled(&mut self) -> HandoffView {
        loop {
            let current = self.view.borrow_and_update().clone();
            if current.status != HandoffStatus::Loading {
                return current;
            }
            if self.view.changed().await.is_err() {
                return self.view.borrow().clone();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_active()
    }

    /// Cancel all outstanding work; nothing is posted or closed afterwards
    pub fn teardown(&mut self) {
        self.task.cancel();
    }
}
