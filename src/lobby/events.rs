//! Events delivered by the lobby transport.

/// One inbound lobby event, already decoded from the wire by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyEvent {
    /// Users already present in a channel when the bridge joined it.
    Clients { channel: String, users: Vec<String> },
    Joined { channel: String, user: String },
    Left { channel: String, user: String },
    Said {
        channel: String,
        user: String,
        text: String,
    },
    /// Emphasized ("/me") chat line.
    SaidEx {
        channel: String,
        user: String,
        text: String,
    },
    /// Login accepted for the given account.
    Accepted { user: String },
    /// Login denied.
    Failed { reason: String },
    /// A user came online on the lobby server.
    AddUser { user: String },
    /// A user went offline.
    RemoveUser { user: String },
}

impl LobbyEvent {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            LobbyEvent::Clients { .. } => "clients",
            LobbyEvent::Joined { .. } => "joined",
            LobbyEvent::Left { .. } => "left",
            LobbyEvent::Said { .. } => "said",
            LobbyEvent::SaidEx { .. } => "saidex",
            LobbyEvent::Accepted { .. } => "accepted",
            LobbyEvent::Failed { .. } => "failed",
            LobbyEvent::AddUser { .. } => "adduser",
            LobbyEvent::RemoveUser { .. } => "removeuser",
        }
    }
}
