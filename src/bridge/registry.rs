//! Channel/room bindings.
//!
//! Built once from configuration and read-only afterwards. Both lookup
//! directions go through indexes into the same binding list.

use std::collections::HashMap;

use crate::config::types::RoomBindingConfig;

/// A configured association between a lobby channel and a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBinding {
    /// Lobby channel name as configured (without `#`).
    pub channel: String,
    pub room_id: String,
    pub enabled: bool,
    pub display_name: String,
}

#[derive(Debug, Default)]
pub struct ChannelRegistry {
    bindings: Vec<ChannelBinding>,
    /// Index: normalized channel name -> binding.
    by_channel: HashMap<String, usize>,
    /// Index: room id -> binding.
    by_room: HashMap<String, usize>,
}

/// Lobby channel names are case-insensitive and may carry a leading `#`.
fn channel_key(channel: &str) -> String {
    channel.trim_start_matches('#').to_lowercase()
}

impl ChannelRegistry {
    pub fn from_config(rooms: &[RoomBindingConfig]) -> Self {
        let mut registry = Self::default();

        for room in rooms {
            let channel = room.channel.trim_start_matches('#').to_string();
            let key = channel_key(&channel);
            // Validation rejects duplicates; first binding wins otherwise
            if registry.by_channel.contains_key(&key) || registry.by_room.contains_key(&room.room_id) {
                continue;
            }

            let idx = registry.bindings.len();
            registry.bindings.push(ChannelBinding {
                display_name: room.display_name.clone().unwrap_or_else(|| channel.clone()),
                channel,
                room_id: room.room_id.clone(),
                enabled: room.enabled,
            });
            registry.by_channel.insert(key, idx);
            registry.by_room.insert(room.room_id.clone(), idx);
        }

        registry
    }

    pub fn by_channel(&self, channel: &str) -> Option<&ChannelBinding> {
        self.by_channel
            .get(&channel_key(channel))
            .map(|&idx| &self.bindings[idx])
    }

    pub fn by_room(&self, room_id: &str) -> Option<&ChannelBinding> {
        self.by_room.get(room_id).map(|&idx| &self.bindings[idx])
    }

    /// Enabled binding for a channel, if any.
    pub fn enabled_by_channel(&self, channel: &str) -> Option<&ChannelBinding> {
        self.by_channel(channel).filter(|binding| binding.enabled)
    }

    /// Enabled binding for a room, if any.
    pub fn enabled_by_room(&self, room_id: &str) -> Option<&ChannelBinding> {
        self.by_room(room_id).filter(|binding| binding.enabled)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &ChannelBinding> {
        self.bindings.iter().filter(|binding| binding.enabled)
    }

    pub fn disabled(&self) -> impl Iterator<Item = &ChannelBinding> {
        self.bindings.iter().filter(|binding| !binding.enabled)
    }
}
