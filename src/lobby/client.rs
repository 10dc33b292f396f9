//! Seams to the lobby transport.
//!
//! The wire protocol lives in the embedding binary. The bridge only needs a
//! way to open a connection ([`LobbyConnector`]) and a handle to issue commands
//! on it ([`LobbyClient`]); inbound traffic arrives as [`LobbyEvent`]s.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::common::error::{ConnectionError, TransportResult};
use crate::common::types::RemoteIdentity;
use crate::config::types::LobbyConfig;
use crate::lobby::events::LobbyEvent;

/// Where and how to reach the lobby server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyEndpoint {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub client_name: String,
    pub flags: Option<String>,
}

impl LobbyEndpoint {
    pub fn from_config(config: &LobbyConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            tls: config.tls,
            client_name: config.client_name.clone(),
            flags: config.client_flags.clone(),
        }
    }
}

impl std::fmt::Display for LobbyEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}{}", self.host, self.port, if self.tls { " (tls)" } else { "" })
    }
}

/// Outbound commands on an open lobby connection.
///
/// `*_from` calls act on behalf of a bridged identity rather than the bridge
/// account itself.
#[async_trait]
pub trait LobbyClient: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> TransportResult<()>;

    /// Join a channel as the bridge account.
    async fn join(&self, channel: &str) -> TransportResult<()>;

    async fn bridged_client_from(
        &self,
        identity: &RemoteIdentity,
        display_name: &str,
    ) -> TransportResult<()>;

    async fn un_bridged_client_from(&self, identity: &RemoteIdentity) -> TransportResult<()>;

    async fn join_from(&self, channel: &str, identity: &RemoteIdentity) -> TransportResult<()>;

    async fn leave_from(&self, channel: &str, identity: &RemoteIdentity) -> TransportResult<()>;

    async fn say_from(
        &self,
        channel: &str,
        identity: &RemoteIdentity,
        text: &str,
    ) -> TransportResult<()>;

    async fn say_ex_from(
        &self,
        channel: &str,
        identity: &RemoteIdentity,
        text: &str,
    ) -> TransportResult<()>;
}

/// An open connection: the command handle plus its inbound event stream.
///
/// The stream ending means the connection was lost.
pub struct LobbyLink {
    pub client: Arc<dyn LobbyClient>,
    pub events: mpsc::UnboundedReceiver<LobbyEvent>,
}

/// Opens lobby connections.
#[async_trait]
pub trait LobbyConnector: Send + Sync {
    async fn connect(&self, endpoint: &LobbyEndpoint) -> Result<LobbyLink, ConnectionError>;
}
