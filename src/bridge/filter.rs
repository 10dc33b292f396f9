//! Regex filters applied to chat text before it crosses the bridge.

use fancy_regex::Regex;
use tracing::warn;

use crate::config::types::FiltersConfig;

/// Which way a chat line is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDirection {
    LobbyToRoom,
    RoomToLobby,
}

#[derive(Debug, Clone)]
struct FilterRule {
    direction: FilterDirection,
    source: String,
    regex: Regex,
}

/// Ordered set of drop rules, each bound to one direction.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    rules: Vec<FilterRule>,
}

impl MessageFilter {
    /// Build a filter from raw patterns. Patterns that fail to compile are
    /// logged and left out.
    pub fn new(lobby_to_room: Vec<String>, room_to_lobby: Vec<String>) -> Self {
        let tagged = lobby_to_room
            .into_iter()
            .map(|p| (FilterDirection::LobbyToRoom, p))
            .chain(room_to_lobby.into_iter().map(|p| (FilterDirection::RoomToLobby, p)));

        let mut rules = Vec::new();
        for (direction, source) in tagged {
            match Regex::new(&source) {
                Ok(regex) => rules.push(FilterRule {
                    direction,
                    source,
                    regex,
                }),
                Err(e) => warn!(pattern = %source, ?direction, "Skipping filter pattern: {}", e),
            }
        }
        Self { rules }
    }

    pub fn from_config(config: Option<&FiltersConfig>) -> Self {
        config
            .map(|f| Self::new(f.lobby_to_room.clone(), f.room_to_lobby.clone()))
            .unwrap_or_default()
    }

    /// True when `text` matches a rule for `direction` and must not be relayed.
    pub fn should_filter(&self, direction: FilterDirection, text: &str) -> bool {
        self.rules
            .iter()
            .filter(|rule| rule.direction == direction)
            .any(|rule| match rule.regex.is_match(text) {
                Ok(matched) => matched,
                Err(e) => {
                    // Backtrack limit hit; let the line through.
                    warn!(pattern = %rule.source, "Filter match failed: {}", e);
                    false
                }
            })
    }

    pub fn has_patterns(&self) -> bool {
        !self.rules.is_empty()
    }
}
