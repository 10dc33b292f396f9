//! Common utilities and types shared across the bridge.

pub mod error;
pub mod reconnect;
pub mod types;

pub use error::{AppError, ConfigError, ConnectionError, SessionError, TransportError, TransportResult};
pub use reconnect::RetryPolicy;
pub use types::{truncate_lobby_name, EventId, RemoteIdentity, RoomId, MAX_LOBBY_NAME_LEN};
