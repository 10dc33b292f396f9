//! Shared types used across the bridge.

/// Opaque room identifier on the room network (`!abc:server`).
pub type RoomId = String;

/// Opaque event identifier on the room network (`$xyz`).
pub type EventId = String;

/// Maximum length of any name handed to the lobby network.
pub const MAX_LOBBY_NAME_LEN: usize = 15;

/// Canonical identity of a participant as seen from the lobby side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemoteIdentity {
    /// Network tag (`springlobby`, `discord`, `freenode.org`, a homeserver domain...).
    pub network: String,
    /// Username on that network.
    pub username: String,
}

impl RemoteIdentity {
    pub fn new(network: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            username: username.into(),
        }
    }
}

impl std::fmt::Display for RemoteIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.username, self.network)
    }
}

/// Truncate a name to the lobby limit, counted in characters.
pub fn truncate_lobby_name(name: &str) -> String {
    name.chars().take(MAX_LOBBY_NAME_LEN).collect()
}
