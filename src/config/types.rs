//! Configuration type definitions.

use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub homeserver: HomeserverConfig,
    pub appservice: AppserviceConfig,
    pub lobby: LobbyConfig,
    pub bridge: BridgeConfig,
    pub filters: Option<FiltersConfig>,
}

/// Room network (homeserver) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HomeserverConfig {
    /// Server name puppets live on.
    pub domain: String,
    /// Base URL for media download links. Defaults to `https://<media server>`.
    #[serde(default)]
    pub media_url: Option<String>,
}

/// Identity of the bridge on the room network.
#[derive(Debug, Clone, Deserialize)]
pub struct AppserviceConfig {
    /// Localpart of the bridge's own service user.
    pub bot_username: String,
    /// Prefix marking bridge-owned puppets (`<namespace>_<name>`).
    pub namespace: String,
    /// Display name set on the bot at startup; `"remove"` clears it.
    #[serde(default)]
    pub bot_displayname: Option<String>,
    /// Room localparts never bridged (other relays' bots).
    #[serde(default = "default_ignored_room_users")]
    pub ignored_users: Vec<String>,
}

/// Lobby server connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LobbyConfig {
    pub host: String,
    #[serde(default = "default_lobby_port")]
    pub port: u16,
    #[serde(default)]
    pub tls: bool,
    pub client_name: String,
    #[serde(default)]
    pub client_flags: Option<String>,
    pub username: String,
    pub password: String,
    /// Network tag given to native lobby users.
    #[serde(default = "default_lobby_network")]
    pub network: String,
    /// Lobby users never mirrored into rooms.
    #[serde(default = "default_ignored_lobby_users")]
    pub ignored_users: Vec<String>,
    /// Longest line forwarded to the lobby in one command.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Reconnect backoff settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// "fixed" or "exponential".
    #[serde(default = "default_retry_strategy")]
    pub strategy: String,
    #[serde(default = "default_retry_delay_secs")]
    pub delay_secs: u64,
    #[serde(default = "default_retry_max_delay_secs")]
    pub max_delay_secs: u64,
    #[serde(default = "default_retry_factor")]
    pub factor: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: default_retry_strategy(),
            delay_secs: default_retry_delay_secs(),
            max_delay_secs: default_retry_max_delay_secs(),
            factor: default_retry_factor(),
        }
    }
}

/// Channel bindings and relay rules.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    pub rooms: Vec<RoomBindingConfig>,
    #[serde(default = "default_relays")]
    pub relays: Vec<RelayConfig>,
}

/// Binds a lobby channel to a room.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomBindingConfig {
    /// Lobby channel name (without `#`).
    pub channel: String,
    /// Room id (`!abc:server`).
    pub room_id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A third-party relay whose room localparts carry a recognizable prefix.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Localpart prefix, e.g. `_discord_`.
    pub prefix: String,
    /// Network tag reported to the lobby, e.g. `discord`.
    pub network: String,
}

/// Message filtering configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltersConfig {
    /// Patterns blocking lobby messages from reaching rooms.
    #[serde(default)]
    pub lobby_to_room: Vec<String>,
    /// Patterns blocking room messages from reaching the lobby.
    #[serde(default)]
    pub room_to_lobby: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_lobby_port() -> u16 {
    8200
}

fn default_lobby_network() -> String {
    "springlobby".to_string()
}

fn default_ignored_room_users() -> Vec<String> {
    vec!["_discord_bot".to_string()]
}

fn default_ignored_lobby_users() -> Vec<String> {
    vec!["ChanServ".to_string()]
}

fn default_max_message_length() -> usize {
    1024
}

fn default_retry_strategy() -> String {
    "fixed".to_string()
}

fn default_retry_delay_secs() -> u64 {
    10
}

fn default_retry_max_delay_secs() -> u64 {
    300
}

fn default_retry_factor() -> f32 {
    2.0
}

fn default_relays() -> Vec<RelayConfig> {
    vec![
        RelayConfig {
            prefix: "_discord_".to_string(),
            network: "discord".to_string(),
        },
        RelayConfig {
            prefix: "freenode_".to_string(),
            network: "freenode.org".to_string(),
        },
    ]
}

impl Config {
    /// Channels the bridge should join on the lobby, in config order.
    pub fn enabled_channels(&self) -> Vec<String> {
        self.bridge
            .rooms
            .iter()
            .filter(|room| room.enabled)
            .map(|room| room.channel.clone())
            .collect()
    }
}
