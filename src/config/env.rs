//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `LOBBY_BRIDGE_LOBBY_HOST` - Lobby server host
//! - `LOBBY_BRIDGE_LOBBY_PORT` - Lobby server port
//! - `LOBBY_BRIDGE_LOBBY_USERNAME` - Lobby account username
//! - `LOBBY_BRIDGE_LOBBY_PASSWORD` - Lobby account password
//! - `LOBBY_BRIDGE_HOMESERVER_DOMAIN` - Homeserver domain
//! - `LOBBY_BRIDGE_NAMESPACE` - Puppet namespace prefix

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "LOBBY_BRIDGE";

/// Apply environment variable overrides to a config.
///
/// Lets credentials be provided via the environment instead of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(host) = env::var(format!("{}_LOBBY_HOST", ENV_PREFIX)) {
        config.lobby.host = host;
    }
    if let Ok(port) = env::var(format!("{}_LOBBY_PORT", ENV_PREFIX)) {
        if let Ok(port) = port.parse() {
            config.lobby.port = port;
        }
    }
    if let Ok(username) = env::var(format!("{}_LOBBY_USERNAME", ENV_PREFIX)) {
        config.lobby.username = username;
    }
    if let Ok(password) = env::var(format!("{}_LOBBY_PASSWORD", ENV_PREFIX)) {
        config.lobby.password = password;
    }

    if let Ok(domain) = env::var(format!("{}_HOMESERVER_DOMAIN", ENV_PREFIX)) {
        config.homeserver.domain = domain;
    }
    if let Ok(namespace) = env::var(format!("{}_NAMESPACE", ENV_PREFIX)) {
        config.appservice.namespace = namespace;
    }

    config
}

/// Returns the names of credential variables that are set but empty.
pub fn check_empty_env_vars() -> Vec<String> {
    let vars = [
        format!("{}_LOBBY_USERNAME", ENV_PREFIX),
        format!("{}_LOBBY_PASSWORD", ENV_PREFIX),
    ];

    vars.into_iter()
        .filter(|var| env::var(var).map(|v| v.is_empty()).unwrap_or(false))
        .collect()
}

/// Get the config file path from environment or use default.
///
/// Checks `LOBBY_BRIDGE_CONFIG`, otherwise returns "lobby-bridge.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "lobby-bridge.conf".to_string())
}
