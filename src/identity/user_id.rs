//! Room network user identifiers (`@localpart:server`).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors from parsing a user id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserIdError {
    #[error("user id '{0}' does not start with '@'")]
    MissingSigil(String),

    #[error("user id '{0}' has no server part")]
    MissingServer(String),

    #[error("user id '{0}' has an empty localpart")]
    EmptyLocalpart(String),
}

/// A fully qualified user id on the room network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId {
    localpart: String,
    server: String,
}

impl UserId {
    pub fn new(localpart: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            localpart: localpart.into(),
            server: server.into(),
        }
    }

    pub fn localpart(&self) -> &str {
        &self.localpart
    }

    pub fn server(&self) -> &str {
        &self.server
    }
}

impl FromStr for UserId {
    type Err = UserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('@')
            .ok_or_else(|| UserIdError::MissingSigil(s.to_string()))?;
        // Server names may carry a port, so split on the first colon only
        let (localpart, server) = rest
            .split_once(':')
            .ok_or_else(|| UserIdError::MissingServer(s.to_string()))?;
        if localpart.is_empty() {
            return Err(UserIdError::EmptyLocalpart(s.to_string()));
        }
        if server.is_empty() {
            return Err(UserIdError::MissingServer(s.to_string()));
        }
        Ok(UserId::new(localpart, server))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}:{}", self.localpart, self.server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: UserId = "@bob:example.org".parse().unwrap();
        assert_eq!(id.localpart(), "bob");
        assert_eq!(id.server(), "example.org");
        assert_eq!(id.to_string(), "@bob:example.org");
    }

    #[test]
    fn test_server_with_port() {
        let id: UserId = "@bob:localhost:8448".parse().unwrap();
        assert_eq!(id.server(), "localhost:8448");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "bob:example.org".parse::<UserId>(),
            Err(UserIdError::MissingSigil("bob:example.org".to_string()))
        );
        assert!(matches!(
            "@bob".parse::<UserId>(),
            Err(UserIdError::MissingServer(_))
        ));
        assert!(matches!(
            "@:example.org".parse::<UserId>(),
            Err(UserIdError::EmptyLocalpart(_))
        ));
    }
}
