//! Configuration file parsing (HOCON format).

use std::path::Path;

use hocon::HoconLoader;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::IoError {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
        });
    }

    HoconLoader::new()
        .load_file(path)
        .map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

/// Load configuration from a HOCON string.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    HoconLoader::new()
        .load_str(content)
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        homeserver {
            domain = "example.org"
        }
        appservice {
            bot_username = "appservice"
            namespace = "spring"
        }
        lobby {
            host = "lobby.springrts.com"
            client_name = "matrix"
            username = "appservice"
            password = "secret"
        }
        bridge {
            rooms = [
                { channel = "main", room_id = "!main:example.org" },
                { channel = "dev", room_id = "!dev:example.org", enabled = false }
            ]
        }
    "#;

    #[test]
    fn test_load_sample_config() {
        let config = load_config_str(SAMPLE).expect("sample config should parse");

        assert_eq!(config.homeserver.domain, "example.org");
        assert_eq!(config.lobby.port, 8200);
        assert!(!config.lobby.tls);
        assert_eq!(config.lobby.network, "springlobby");
        assert_eq!(config.lobby.retry.delay_secs, 10);
        assert_eq!(config.bridge.rooms.len(), 2);
        assert!(config.bridge.rooms[0].enabled);
        assert!(!config.bridge.rooms[1].enabled);
        assert_eq!(config.bridge.relays.len(), 2);
        assert_eq!(config.appservice.ignored_users, vec!["_discord_bot"]);
        assert_eq!(config.enabled_channels(), vec!["main"]);
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let result = load_config_str("homeserver { domain = \"x\" }");
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_config("/nonexistent/lobby-bridge.conf");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
