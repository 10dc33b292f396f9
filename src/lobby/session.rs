//! Lobby session lifecycle.
//!
//! `DISCONNECTED -> CONNECTING -> AUTHENTICATING -> JOINING_CHANNELS -> ACTIVE`
//!
//! A session is never repaired in place. When the transport drops, the caller
//! hands the dead session back to [`SessionManager::reconnect`] and receives a
//! brand-new one.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::bridge::channels::{wait_for_shutdown, SessionChannels};
use crate::common::error::{ConnectionError, SessionError};
use crate::common::reconnect::RetryPolicy;
use crate::config::types::Config;
use crate::lobby::client::{LobbyClient, LobbyConnector, LobbyEndpoint, LobbyLink};
use crate::lobby::events::LobbyEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    JoiningChannels,
    Active,
}

/// Lifecycle notifications consumed by the membership sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// First session of this run is up.
    Available { key: String },
    /// A replacement session is up after an outage.
    Reconnected { key: String },
}

/// Lobby account used by the bridge itself.
#[derive(Clone)]
pub struct LobbyCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LobbyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LobbyCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// One authenticated lobby connection.
pub struct BridgeSession {
    key: String,
    endpoint: LobbyEndpoint,
    credentials: LobbyCredentials,
    client: Arc<dyn LobbyClient>,
    events: mpsc::UnboundedReceiver<LobbyEvent>,
    joined_channels: BTreeSet<String>,
    attempts: u32,
}

impl BridgeSession {
    /// Unique key: `<sequence>:<host>:<port><+|->`, `+` meaning TLS.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn endpoint(&self) -> &LobbyEndpoint {
        &self.endpoint
    }

    pub fn client(&self) -> &Arc<dyn LobbyClient> {
        &self.client
    }

    pub fn joined_channels(&self) -> &BTreeSet<String> {
        &self.joined_channels
    }

    /// Connection attempts it took to establish this session.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Next inbound event, or `None` once the connection is gone.
    pub async fn next_event(&mut self) -> Option<LobbyEvent> {
        self.events.recv().await
    }
}

impl fmt::Debug for BridgeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeSession")
            .field("key", &self.key)
            .field("joined_channels", &self.joined_channels)
            .field("attempts", &self.attempts)
            .finish()
    }
}

fn session_key(sequence: u64, endpoint: &LobbyEndpoint) -> String {
    format!(
        "{}:{}:{}{}",
        sequence,
        endpoint.host,
        endpoint.port,
        if endpoint.tls { '+' } else { '-' }
    )
}

/// Owns the single outbound connection to the lobby network.
pub struct SessionManager {
    connector: Arc<dyn LobbyConnector>,
    endpoint: LobbyEndpoint,
    credentials: LobbyCredentials,
    channels: Vec<String>,
    policy: RetryPolicy,
    notice_tx: mpsc::UnboundedSender<SessionNotice>,
    shutdown_rx: watch::Receiver<bool>,
    state: SessionState,
    sequence: u64,
}

impl SessionManager {
    pub fn new(config: &Config, connector: Arc<dyn LobbyConnector>, channels: SessionChannels) -> Self {
        Self {
            connector,
            endpoint: LobbyEndpoint::from_config(&config.lobby),
            credentials: LobbyCredentials {
                username: config.lobby.username.clone(),
                password: config.lobby.password.clone(),
            },
            channels: config.enabled_channels(),
            policy: RetryPolicy::from_config(&config.lobby.retry),
            notice_tx: channels.notice_tx,
            shutdown_rx: channels.shutdown_rx,
            state: SessionState::Disconnected,
            sequence: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Establish the first session. The first attempt is made immediately.
    ///
    /// Transport failures are retried forever; only a rejected login or a
    /// shutdown request ends the loop with an error.
    pub async fn connect(&mut self) -> Result<BridgeSession, SessionError> {
        let endpoint = self.endpoint.clone();
        let credentials = self.credentials.clone();
        let session = self.establish(endpoint, credentials, false).await?;
        self.notify(SessionNotice::Available {
            key: session.key.clone(),
        });
        Ok(session)
    }

    /// Replace a lost session, reusing its endpoint and credentials.
    ///
    /// Waits one retry delay before the first attempt.
    pub async fn reconnect(&mut self, previous: &BridgeSession) -> Result<BridgeSession, SessionError> {
        info!(session = %previous.key, "Lobby session lost, reconnecting");
        let endpoint = previous.endpoint.clone();
        let credentials = previous.credentials.clone();
        let session = self.establish(endpoint, credentials, true).await?;
        self.notify(SessionNotice::Reconnected {
            key: session.key.clone(),
        });
        Ok(session)
    }

    fn notify(&self, notice: SessionNotice) {
        if let Err(e) = self.notice_tx.send(notice) {
            warn!("Failed to publish session notice: {}", e);
        }
    }

    async fn establish(
        &mut self,
        endpoint: LobbyEndpoint,
        credentials: LobbyCredentials,
        wait_first: bool,
    ) -> Result<BridgeSession, SessionError> {
        let mut delays = self.policy.backoff();
        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut attempts: u32 = 0;

        loop {
            if attempts > 0 || wait_first {
                self.state = SessionState::Disconnected;
                let delay = delays.next().unwrap_or_else(|| self.policy.ceiling());
                info!("Retrying lobby connection to {} in {:?}", endpoint, delay);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = wait_for_shutdown(&mut shutdown_rx) => {
                        return Err(SessionError::Shutdown);
                    }
                }
            }
            attempts += 1;

            let result = tokio::select! {
                result = self.attempt(&endpoint, &credentials) => result,
                _ = wait_for_shutdown(&mut shutdown_rx) => Err(SessionError::Shutdown),
            };

            match result {
                Ok((client, events, joined_channels)) => {
                    self.sequence += 1;
                    let key = session_key(self.sequence, &endpoint);
                    self.state = SessionState::Active;
                    info!(session = %key, attempts, "Lobby session active");
                    return Ok(BridgeSession {
                        key,
                        endpoint,
                        credentials,
                        client,
                        events,
                        joined_channels,
                        attempts,
                    });
                }
                Err(e) if e.is_transient() => {
                    warn!(attempt = attempts, "Lobby connection failed: {}", e);
                }
                Err(e) => {
                    self.state = SessionState::Disconnected;
                    if matches!(e, SessionError::AuthFailed { .. }) {
                        error!("{}", e);
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn attempt(
        &mut self,
        endpoint: &LobbyEndpoint,
        credentials: &LobbyCredentials,
    ) -> Result<
        (
            Arc<dyn LobbyClient>,
            mpsc::UnboundedReceiver<LobbyEvent>,
            BTreeSet<String>,
        ),
        SessionError,
    > {
        self.state = SessionState::Connecting;
        debug!("Connecting to lobby at {}", endpoint);
        let LobbyLink { client, mut events } = self.connector.connect(endpoint).await?;

        self.state = SessionState::Authenticating;
        client
            .login(&credentials.username, &credentials.password)
            .await
            .map_err(|e| ConnectionError::ConnectFailed {
                host: endpoint.host.clone(),
                port: endpoint.port,
                message: e.to_string(),
            })?;
        await_login(&mut events).await?;

        self.state = SessionState::JoiningChannels;
        let results = join_all(self.channels.iter().map(|channel| client.join(channel))).await;
        let mut joined = BTreeSet::new();
        for (channel, result) in self.channels.iter().zip(results) {
            match result {
                Ok(()) => {
                    joined.insert(channel.clone());
                }
                Err(e) => warn!(channel = %channel, "Failed to join lobby channel: {}", e),
            }
        }

        Ok((client, events, joined))
    }
}

/// Wait for the login verdict. Anything else before it is noise.
async fn await_login(events: &mut mpsc::UnboundedReceiver<LobbyEvent>) -> Result<(), SessionError> {
    loop {
        match events.recv().await {
            Some(LobbyEvent::Accepted { user }) => {
                info!(user = %user, "Lobby login accepted");
                return Ok(());
            }
            Some(LobbyEvent::Failed { reason }) => {
                return Err(SessionError::AuthFailed { reason });
            }
            Some(other) => debug!("Ignoring '{}' before login", other.kind()),
            None => return Err(ConnectionError::ConnectionClosed.into()),
        }
    }
}
