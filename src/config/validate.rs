//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use std::collections::HashSet;

use fancy_regex::Regex;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Homeserver / appservice
    if config.homeserver.domain.is_empty() {
        errors.push("homeserver.domain is required".to_string());
    }
    if config.appservice.bot_username.is_empty() {
        errors.push("appservice.bot_username is required".to_string());
    }
    let namespace = &config.appservice.namespace;
    if namespace.is_empty() {
        errors.push("appservice.namespace is required".to_string());
    } else if !namespace
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' || c == '.')
    {
        errors.push(format!(
            "appservice.namespace '{}' may only contain lowercase letters, digits, '_', '-' and '.'",
            namespace
        ));
    } else if config
        .appservice
        .bot_username
        .starts_with(&format!("{}_", namespace))
    {
        errors.push(format!(
            "appservice.bot_username '{}' must not carry the puppet prefix '{}_'",
            config.appservice.bot_username, namespace
        ));
    }

    // Lobby
    if config.lobby.host.is_empty() {
        errors.push("lobby.host is required".to_string());
    }
    if config.lobby.port == 0 {
        errors.push("lobby.port must be non-zero".to_string());
    }
    if config.lobby.client_name.is_empty() {
        errors.push("lobby.client_name is required".to_string());
    }
    if config.lobby.username.is_empty() {
        errors.push("lobby.username is required".to_string());
    }
    if config.lobby.password.is_empty() {
        errors.push("lobby.password is required".to_string());
    }
    if config.lobby.password == "YOUR_LOBBY_PASSWORD_HERE" {
        errors.push("lobby.password has not been configured (still using placeholder)".to_string());
    }
    if config.lobby.network.is_empty() {
        errors.push("lobby.network must not be empty".to_string());
    }
    if config.lobby.max_message_length < 16 {
        errors.push(format!(
            "lobby.max_message_length must be at least 16 (got {})",
            config.lobby.max_message_length
        ));
    }

    let retry = &config.lobby.retry;
    if !["fixed", "exponential"].contains(&retry.strategy.to_lowercase().as_str()) {
        errors.push(format!(
            "lobby.retry.strategy '{}' is invalid (use: fixed, exponential)",
            retry.strategy
        ));
    }
    if retry.delay_secs == 0 {
        errors.push("lobby.retry.delay_secs must be non-zero".to_string());
    }
    if retry.factor < 1.0 {
        errors.push("lobby.retry.factor must be at least 1.0".to_string());
    }

    // Room bindings
    if config.bridge.rooms.is_empty() {
        errors.push("bridge.rooms is empty - no channels configured".to_string());
    }
    let mut channels = HashSet::new();
    let mut room_ids = HashSet::new();
    for (i, room) in config.bridge.rooms.iter().enumerate() {
        let channel = room.channel.trim_start_matches('#').to_lowercase();
        if channel.is_empty() {
            errors.push(format!("bridge.rooms[{}].channel is required", i));
        } else if !channels.insert(channel) {
            errors.push(format!(
                "bridge.rooms[{}].channel '{}' is bound more than once",
                i, room.channel
            ));
        }
        if !room.room_id.starts_with('!') {
            errors.push(format!(
                "bridge.rooms[{}].room_id '{}' is not a room id (expected '!id:server')",
                i, room.room_id
            ));
        } else if !room_ids.insert(room.room_id.clone()) {
            errors.push(format!(
                "bridge.rooms[{}].room_id '{}' is bound more than once",
                i, room.room_id
            ));
        }
    }

    // Relay rules
    for (i, relay) in config.bridge.relays.iter().enumerate() {
        if relay.prefix.is_empty() {
            errors.push(format!("bridge.relays[{}].prefix is required", i));
        }
        if relay.network.is_empty() {
            errors.push(format!("bridge.relays[{}].network is required", i));
        }
    }

    // Filter patterns (try to compile them)
    if let Some(ref filters) = config.filters {
        for (name, patterns) in [
            ("lobby_to_room", &filters.lobby_to_room),
            ("room_to_lobby", &filters.room_to_lobby),
        ] {
            for (i, pattern) in patterns.iter().enumerate() {
                if Regex::new(pattern).is_err() {
                    errors.push(format!(
                        "filters.{}[{}] is not a valid regex: '{}'",
                        name, i, pattern
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::make_test_config;
    use crate::config::types::*;

    #[test]
    fn test_valid_config_passes() {
        let config = make_test_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_password_fails() {
        let mut config = make_test_config();
        config.lobby.password = String::new();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("lobby.password"));
    }

    #[test]
    fn test_placeholder_password_fails() {
        let mut config = make_test_config();
        config.lobby.password = "YOUR_LOBBY_PASSWORD_HERE".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("placeholder"));
    }

    #[test]
    fn test_bot_username_with_puppet_prefix_fails() {
        let mut config = make_test_config();
        config.appservice.bot_username = "spring_bot".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("puppet prefix"));
    }

    #[test]
    fn test_duplicate_channel_fails() {
        let mut config = make_test_config();
        config.bridge.rooms.push(RoomBindingConfig {
            channel: "#Main".to_string(),
            room_id: "!other:example.org".to_string(),
            enabled: true,
            display_name: None,
        });

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("more than once"));
    }

    #[test]
    fn test_bad_room_id_fails() {
        let mut config = make_test_config();
        config.bridge.rooms[0].room_id = "#alias:example.org".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("not a room id"));
    }

    #[test]
    fn test_invalid_regex_filter_fails() {
        let mut config = make_test_config();
        config.filters = Some(FiltersConfig {
            lobby_to_room: vec!["[invalid".to_string()],
            room_to_lobby: Vec::new(),
        });

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("not a valid regex"));
    }

    #[test]
    fn test_invalid_retry_strategy_fails() {
        let mut config = make_test_config();
        config.lobby.retry.strategy = "random".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("retry.strategy"));
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = make_test_config();
        config.lobby.host = String::new();
        config.lobby.port = 0;

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("lobby.host"));
        assert!(message.contains("lobby.port"));
    }
}
