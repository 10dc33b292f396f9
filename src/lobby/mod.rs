//! Lobby side: event model, transport seams and the session manager.

pub mod client;
pub mod events;
pub mod session;

pub use client::{LobbyClient, LobbyConnector, LobbyEndpoint, LobbyLink};
pub use events::LobbyEvent;
pub use session::{BridgeSession, SessionManager, SessionNotice, SessionState};
