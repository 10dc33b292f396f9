//! Bridge runtime state.
//!
//! - `MembershipTracker`: what the bridge has already done on both networks
//!   during this run, so repeated events become no-ops
//! - `UserInfoCache`: profile lookups for room users, scoped to one sync pass
//!   or one event
//!
//! Both live inside the single dispatch loop and are never shared across tasks.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::common::types::{RemoteIdentity, RoomId};
use crate::identity::UserId;

/// Lifecycle of a room user mirrored onto the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantState {
    Unknown,
    /// Registered as a bridged lobby client, in no channel yet.
    Bridged,
    Joined,
    /// Left its last channel and was un-bridged.
    Left,
}

/// Result of recording a lobby channel departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The client was not in that channel.
    NotJoined,
    /// The client is still in other channels.
    StillJoined,
    /// That was the client's last channel.
    LastChannel,
}

#[derive(Debug, Default)]
pub struct MembershipTracker {
    /// Puppets whose profile has been set up.
    profiles: HashSet<UserId>,
    /// Puppet -> rooms it was joined into.
    puppet_rooms: HashMap<UserId, BTreeSet<RoomId>>,
    /// Rooms the bridge bot has joined.
    bot_rooms: HashSet<RoomId>,
    /// Bridged lobby client -> lobby channels (lowercased).
    lobby_clients: HashMap<RemoteIdentity, BTreeSet<String>>,
    departed: HashSet<RemoteIdentity>,
}

impl MembershipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // Room side

    pub fn has_profile(&self, puppet: &UserId) -> bool {
        self.profiles.contains(puppet)
    }

    pub fn mark_profile(&mut self, puppet: UserId) -> bool {
        self.profiles.insert(puppet)
    }

    pub fn is_puppet_in(&self, puppet: &UserId, room_id: &str) -> bool {
        self.puppet_rooms
            .get(puppet)
            .is_some_and(|rooms| rooms.contains(room_id))
    }

    /// Record a puppet joining a room. Returns false if it already was there.
    pub fn puppet_joined(&mut self, puppet: UserId, room_id: &str) -> bool {
        self.puppet_rooms
            .entry(puppet)
            .or_default()
            .insert(room_id.to_string())
    }

    /// Record a puppet leaving a room. Returns false if it was not there.
    pub fn puppet_left(&mut self, puppet: &UserId, room_id: &str) -> bool {
        let Some(rooms) = self.puppet_rooms.get_mut(puppet) else {
            return false;
        };
        let removed = rooms.remove(room_id);
        if rooms.is_empty() {
            self.puppet_rooms.remove(puppet);
        }
        removed
    }

    /// Forget every room of a puppet, returning them.
    pub fn take_puppet_rooms(&mut self, puppet: &UserId) -> Vec<RoomId> {
        self.puppet_rooms
            .remove(puppet)
            .map(|rooms| rooms.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn bot_in(&self, room_id: &str) -> bool {
        self.bot_rooms.contains(room_id)
    }

    pub fn bot_joined(&mut self, room_id: &str) -> bool {
        self.bot_rooms.insert(room_id.to_string())
    }

    pub fn bot_left(&mut self, room_id: &str) -> bool {
        self.bot_rooms.remove(room_id)
    }

    // Lobby side

    pub fn is_registered(&self, identity: &RemoteIdentity) -> bool {
        self.lobby_clients.contains_key(identity)
    }

    /// Record a lobby registration. Returns false if already registered.
    pub fn register_client(&mut self, identity: RemoteIdentity) -> bool {
        if self.lobby_clients.contains_key(&identity) {
            return false;
        }
        self.departed.remove(&identity);
        self.lobby_clients.insert(identity, BTreeSet::new());
        true
    }

    pub fn is_client_in(&self, identity: &RemoteIdentity, channel: &str) -> bool {
        self.lobby_clients
            .get(identity)
            .is_some_and(|channels| channels.contains(&channel.to_lowercase()))
    }

    /// Record a registered client joining a channel. Returns false if it
    /// already was there or is not registered.
    pub fn client_joined(&mut self, identity: &RemoteIdentity, channel: &str) -> bool {
        self.lobby_clients
            .get_mut(identity)
            .is_some_and(|channels| channels.insert(channel.to_lowercase()))
    }

    /// Record a client leaving a channel. On [`Departure::LastChannel`] the
    /// registration is dropped and the client counts as left.
    pub fn client_left(&mut self, identity: &RemoteIdentity, channel: &str) -> Departure {
        let Some(channels) = self.lobby_clients.get_mut(identity) else {
            return Departure::NotJoined;
        };
        if !channels.remove(&channel.to_lowercase()) {
            return Departure::NotJoined;
        }
        if !channels.is_empty() {
            return Departure::StillJoined;
        }
        self.lobby_clients.remove(identity);
        self.departed.insert(identity.clone());
        Departure::LastChannel
    }

    pub fn participant_state(&self, identity: &RemoteIdentity) -> ParticipantState {
        match self.lobby_clients.get(identity) {
            Some(channels) if channels.is_empty() => ParticipantState::Bridged,
            Some(_) => ParticipantState::Joined,
            None if self.departed.contains(identity) => ParticipantState::Left,
            None => ParticipantState::Unknown,
        }
    }

    /// Forget lobby-side state. A new session starts with no bridged clients.
    pub fn reset_lobby(&mut self) {
        self.lobby_clients.clear();
        self.departed.clear();
    }
}

/// Profile data for a room user, resolved once per sync pass or event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUserInfo {
    /// Network tag reported to the lobby.
    pub domain: String,
    pub username: String,
    pub display_name: String,
}

impl PendingUserInfo {
    pub fn identity(&self) -> RemoteIdentity {
        RemoteIdentity::new(&self.domain, &self.username)
    }
}

#[derive(Debug, Default)]
pub struct UserInfoCache {
    entries: HashMap<UserId, PendingUserInfo>,
}

impl UserInfoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user: &UserId) -> Option<&PendingUserInfo> {
        self.entries.get(user)
    }

    pub fn insert(&mut self, user: UserId, info: PendingUserInfo) {
        self.entries.insert(user, info);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
