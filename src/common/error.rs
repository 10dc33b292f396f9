//! Error types for the bridge.

use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Lobby session error: {0}")]
    Session(#[from] SessionError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Transient lobby transport failures. Always retried, never escalated.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Connection to {host}:{port} refused")]
    Refused { host: String, port: u16 },

    #[error("Failed to connect to {host}:{port}: {message}")]
    ConnectFailed {
        host: String,
        port: u16,
        message: String,
    },

    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lobby session lifecycle errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Credentials were rejected. Fatal: they will not self-correct.
    #[error("Lobby authentication failed: {reason}")]
    AuthFailed { reason: String },

    #[error("Lobby connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Shutdown requested")]
    Shutdown,
}

impl SessionError {
    /// Whether the session manager should keep retrying after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::Connection(_))
    }
}

/// Failure of a single call into one of the collaborator transports.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request rejected: {message}")]
    Rejected { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Transport unavailable")]
    Unavailable,
}

/// Result type alias for collaborator calls.
pub type TransportResult<T> = std::result::Result<T, TransportError>;
