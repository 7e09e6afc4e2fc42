//! Notification agent
//!
//! One agent per open admin page. It moves through a small state machine:
//!
//! - `Connecting`: check the stored credential, open the socket and announce
//!   the identity. No acknowledgement is awaited.
//! - `BoundPending`: react to every envelope that arrives (desktop notification
//!   and section refreshes).
//! - `Closed`: the socket went away; after a fixed delay go back to `Connecting`.
//! - `LoginRequired`: the credential is missing, unreadable or expired. The page
//!   is sent to the login flow and the agent stops.
//!
//! Transport errors are only logged; the close that follows drives reconnection.
//!
//! Independent of the socket, the stats section is refreshed on a fixed period
//! so a silently degraded channel still leaves the page roughly current.

use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep};
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use tungstenite::client::IntoClientRequest;
use tungstenite::protocol::Message as WsMessage;

use crate::agent::credential::CredentialStatus;
use crate::agent::desktop::{DesktopNotifier, Permission, notify_desktop};
use crate::agent::refresh::{AdminPage, RefreshTarget, refresh_targets};
use crate::config::AgentSettings;
use crate::notify::Envelope;
use crate::persistence::CredentialStore;
use crate::registry::AdminId;
use crate::transport::ClientMessage;
use crate::utils::error::AgentError;

/// Fixed pause between losing the connection and the next attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Default period of the fallback stats refresh.
pub const DEFAULT_STATS_REFRESH: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AgentOptions {
    url: String,
    reconnect_delay: Duration,
    stats_refresh: Duration,
}

impl AgentOptions {
    pub fn new(url: impl Into<String>, reconnect_delay: Duration) -> Result<Self, AgentError> {
        let url = url.into();
        if let Err(e) = url.as_str().into_client_request() {
            return Err(AgentError::Url {
                url,
                reason: e.to_string(),
            });
        }
        Ok(Self {
            url,
            reconnect_delay,
            stats_refresh: DEFAULT_STATS_REFRESH,
        })
    }

    /// Period of the fallback stats refresh. `Duration::ZERO` disables it.
    pub fn with_stats_refresh(mut self, period: Duration) -> Self {
        self.stats_refresh = period;
        self
    }

    pub fn from_settings(settings: &AgentSettings) -> Result<Self, AgentError> {
        Ok(Self::new(
            settings.url.clone(),
            Duration::from_millis(settings.reconnect_delay_ms),
        )?
        .with_stats_refresh(Duration::from_millis(settings.stats_refresh_ms)))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    pub fn stats_refresh(&self) -> Duration {
        self.stats_refresh
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Connecting,
    BoundPending,
    Closed,
    LoginRequired,
}

/// Why `run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentExit {
    LoginRequired,
}

pub struct NotificationAgent<S, P, D> {
    options: AgentOptions,
    store: S,
    page: P,
    desktop: D,
    state: AgentState,
    attempts: u64,
    stats_ticker: Option<Interval>,
}

impl<S, P, D> NotificationAgent<S, P, D>
where
    S: CredentialStore,
    P: AdminPage,
    D: DesktopNotifier,
{
    pub fn new(options: AgentOptions, store: S, page: P, desktop: D) -> Self {
        Self {
            options,
            store,
            page,
            desktop,
            state: AgentState::Closed,
            attempts: 0,
            stats_ticker: None,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Connection attempts made so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn desktop(&self) -> &D {
        &self.desktop
    }

    /// Connect, listen and reconnect until the credential stops being usable.
    pub async fn run(&mut self) -> Result<AgentExit, AgentError> {
        self.prime_permission();

        loop {
            self.state = AgentState::Connecting;
            let Some(admin_id) = self.resolve_identity()? else {
                self.state = AgentState::LoginRequired;
                self.page.redirect_to_login();
                return Ok(AgentExit::LoginRequired);
            };

            self.attempts += 1;
            match connect_async(self.options.url.as_str()).await {
                Ok((ws_stream, _)) => {
                    info!(url = %self.options.url, "WebSocket connected");
                    self.listen(ws_stream, &admin_id).await;
                }
                Err(e) => {
                    warn!(url = %self.options.url, error = %e, "WebSocket connection failed");
                }
            }

            self.state = AgentState::Closed;
            info!(
                delay_ms = self.options.reconnect_delay.as_millis() as u64,
                "WebSocket disconnected, reconnecting after delay"
            );
            self.pause_before_reconnect().await;
        }
    }

    /// Wait out the reconnect delay, still serving the fallback refresh.
    async fn pause_before_reconnect(&mut self) {
        let mut ticker = self.take_stats_ticker();
        let pause = sleep(self.options.reconnect_delay);
        tokio::pin!(pause);

        loop {
            tokio::select! {
                _ = &mut pause => break,
                _ = next_tick(&mut ticker) => self.refresh_stats(),
            }
        }
        self.stats_ticker = ticker;
    }

    fn take_stats_ticker(&mut self) -> Option<Interval> {
        if let Some(ticker) = self.stats_ticker.take() {
            return Some(ticker);
        }
        let period = self.options.stats_refresh;
        if period.is_zero() {
            return None;
        }
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(ticker)
    }

    fn refresh_stats(&mut self) {
        debug!("Periodic stats refresh");
        self.page.refresh(RefreshTarget::Stats);
    }

    /// Ask for desktop permission up front if the user has not decided yet.
    pub fn prime_permission(&mut self) -> Permission {
        match self.desktop.permission() {
            Permission::Default => self.desktop.request_permission(),
            current => current,
        }
    }

    /// The identity to announce on the next connection, or `None` when the
    /// login flow has to take over. Unusable credentials are cleared.
    pub fn resolve_identity(&mut self) -> Result<Option<AdminId>, AgentError> {
        let token = self.store.load()?;
        match CredentialStatus::of(token.as_deref(), Utc::now()) {
            CredentialStatus::Valid(claims) => Ok(Some(claims.id)),
            CredentialStatus::Expired(claims) => {
                warn!(admin_id = %claims.id, expired_at = ?claims.expires_at(), "Stored credential expired");
                self.store.clear()?;
                Ok(None)
            }
            CredentialStatus::Unreadable(e) => {
                warn!(error = %e, "Stored credential unreadable");
                self.store.clear()?;
                Ok(None)
            }
            CredentialStatus::Missing => {
                info!("No stored credential");
                Ok(None)
            }
        }
    }

    /// Announce `admin_id` on an established socket and serve it until it
    /// closes or fails.
    pub async fn listen<T>(&mut self, mut ws_stream: WebSocketStream<T>, admin_id: &AdminId)
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let login = ClientMessage::admin_login_frame(admin_id);
        if let Err(e) = ws_stream.send(WsMessage::text(login)).await {
            warn!(admin_id = %admin_id, error = %e, "Failed to announce identity");
            return;
        }
        self.state = AgentState::BoundPending;
        info!(admin_id = %admin_id, "Identity announced");

        let mut ticker = self.take_stats_ticker();
        loop {
            tokio::select! {
                msg = ws_stream.next() => match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        self.handle_frame(text.as_str());
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        info!(reason = ?frame, "Server closed connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    None => break,
                },
                _ = next_tick(&mut ticker) => self.refresh_stats(),
            }
        }
        self.stats_ticker = ticker;
    }

    /// Handle one raw frame from the server. Frames that are not envelopes are
    /// logged and dropped.
    pub fn handle_frame(&mut self, raw: &str) -> &'static [RefreshTarget] {
        match serde_json::from_str::<Envelope>(raw) {
            Ok(envelope) => self.handle_envelope(&envelope),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed notification");
                &[]
            }
        }
    }

    pub fn handle_envelope(&mut self, envelope: &Envelope) -> &'static [RefreshTarget] {
        debug!(event = %envelope.event, message = %envelope.message, "Received notification");

        if envelope.is_browser_notification {
            notify_desktop(&mut self.desktop, &envelope.message);
        }

        let targets = refresh_targets(&envelope.event);
        for target in targets {
            self.page.refresh(*target);
        }
        targets
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
