//! Shared bridge context.
//!
//! Everything the router and the sync engine consult on every translation:
//! the room transport, the binding registry, the identity codec and the
//! handful of identities that must never be bridged. Built once at startup and
//! handed down explicitly.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::bridge::filter::MessageFilter;
use crate::bridge::registry::ChannelRegistry;
use crate::bridge::state::{MembershipTracker, PendingUserInfo, UserInfoCache};
use crate::common::types::truncate_lobby_name;
use crate::config::types::Config;
use crate::identity::{IdentityCodec, UserId};
use crate::lobby::client::LobbyClient;
use crate::room::adapter::RoomEventAdapter;
use crate::room::intent::RoomIntent;

pub struct BridgeContext {
    pub room: Arc<dyn RoomIntent>,
    pub registry: ChannelRegistry,
    pub codec: IdentityCodec,
    pub filter: MessageFilter,
    /// The bridge's own room identity.
    pub bot_user: UserId,
    pub bot_displayname: Option<String>,
    /// The bridge's own lobby account.
    pub lobby_username: String,
    pub ignored_lobby_users: Vec<String>,
    pub ignored_room_users: Vec<String>,
    pub media_base: Option<String>,
    pub max_line_length: usize,
}

impl BridgeContext {
    pub fn from_config(config: &Config, room: Arc<dyn RoomIntent>) -> Self {
        let filter = MessageFilter::from_config(config.filters.as_ref());
        if filter.has_patterns() {
            info!("Message filters enabled");
        }

        Self {
            room,
            registry: ChannelRegistry::from_config(&config.bridge.rooms),
            codec: IdentityCodec::from_config(config),
            filter,
            bot_user: UserId::new(&config.appservice.bot_username, &config.homeserver.domain),
            bot_displayname: config.appservice.bot_displayname.clone(),
            lobby_username: config.lobby.username.clone(),
            ignored_lobby_users: config.lobby.ignored_users.clone(),
            ignored_room_users: config.appservice.ignored_users.clone(),
            media_base: config.homeserver.media_url.clone(),
            max_line_length: config.lobby.max_message_length,
        }
    }

    /// Adapter filtering raw room events against this context's identities.
    pub fn room_adapter(&self) -> RoomEventAdapter {
        RoomEventAdapter::new(
            self.codec.clone(),
            self.bot_user.clone(),
            self.ignored_room_users.clone(),
        )
    }

    /// Lobby users that must never get a puppet: the bridge itself and ignored accounts.
    pub fn is_excluded_lobby_user(&self, user: &str) -> bool {
        user.eq_ignore_ascii_case(&self.lobby_username)
            || self
                .ignored_lobby_users
                .iter()
                .any(|ignored| ignored.eq_ignore_ascii_case(user))
    }

    /// Room users that must never be mirrored onto the lobby.
    pub fn is_excluded_room_user(&self, user: &UserId) -> bool {
        *user == self.bot_user
            || self.codec.is_bridge_owned(user)
            || self
                .ignored_room_users
                .iter()
                .any(|ignored| ignored.eq_ignore_ascii_case(user.localpart()))
    }

    /// Lobby-side identity and display name of a room user.
    ///
    /// A failed display name lookup falls back to the username.
    pub async fn resolve_user(&self, user: &UserId, cache: &mut UserInfoCache) -> PendingUserInfo {
        if let Some(info) = cache.get(user) {
            return info.clone();
        }

        let identity = self.codec.derive(user);
        let raw = match self.room.get_displayname(user).await {
            Ok(name) => name,
            Err(e) => {
                warn!(user = %user, "Display name lookup failed, using username: {}", e);
                None
            }
        };
        let info = PendingUserInfo {
            display_name: self.codec.display_name(raw.as_deref(), &identity.username),
            domain: identity.network,
            username: identity.username,
        };
        cache.insert(user.clone(), info.clone());
        info
    }

    /// Make sure the puppet for a lobby user exists with a display name.
    ///
    /// Returns the puppet id, or `None` if it could not be registered.
    pub async fn ensure_puppet(&self, tracker: &mut MembershipTracker, lobby_user: &str) -> Option<UserId> {
        let puppet = self.codec.encode(self.codec.lobby_network(), lobby_user);
        if tracker.has_profile(&puppet) {
            return Some(puppet);
        }

        if let Err(e) = self.room.register(&puppet).await {
            warn!(user = %lobby_user, puppet = %puppet, "Failed to register puppet: {}", e);
            return None;
        }
        let display_name = truncate_lobby_name(lobby_user);
        if let Err(e) = self.room.set_displayname(&puppet, &display_name).await {
            warn!(puppet = %puppet, "Failed to set display name: {}", e);
        }
        tracker.mark_profile(puppet.clone());
        Some(puppet)
    }

    /// Put a lobby user's puppet into a room. No-op if it is already there.
    pub async fn join_puppet(
        &self,
        tracker: &mut MembershipTracker,
        lobby_user: &str,
        room_id: &str,
    ) -> Option<UserId> {
        let puppet = self.ensure_puppet(tracker, lobby_user).await?;
        if tracker.is_puppet_in(&puppet, room_id) {
            debug!(puppet = %puppet, room_id = %room_id, "Puppet already in room");
            return Some(puppet);
        }

        match self.room.join_room(&puppet, room_id).await {
            Ok(()) => {
                tracker.puppet_joined(puppet.clone(), room_id);
                Some(puppet)
            }
            Err(e) => {
                warn!(puppet = %puppet, room_id = %room_id, "Failed to join puppet to room: {}", e);
                None
            }
        }
    }

    /// Register a room user as a bridged lobby client and join it into a
    /// channel. Each step is skipped if already done this session.
    ///
    /// Returns true if the client ends up in the channel.
    pub async fn bridge_member(
        &self,
        tracker: &mut MembershipTracker,
        lobby: &dyn LobbyClient,
        info: &PendingUserInfo,
        channel: &str,
    ) -> bool {
        let identity = info.identity();

        if !tracker.is_registered(&identity) {
            if let Err(e) = lobby.bridged_client_from(&identity, &info.display_name).await {
                warn!(user = %identity, "Failed to bridge client: {}", e);
                return false;
            }
            tracker.register_client(identity.clone());
        }

        if tracker.is_client_in(&identity, channel) {
            return true;
        }
        match lobby.join_from(channel, &identity).await {
            Ok(()) => {
                tracker.client_joined(&identity, channel);
                true
            }
            Err(e) => {
                warn!(user = %identity, channel = %channel, "Failed to join bridged client: {}", e);
                false
            }
        }
    }

    /// Acknowledge a forwarded room event. Failures are logged, never retried.
    pub async fn mark_read(&self, room_id: &str, event_id: &str) {
        if event_id.is_empty() {
            return;
        }
        if let Err(e) = self.room.mark_read(&self.bot_user, room_id, event_id).await {
            warn!(room_id = %room_id, event_id = %event_id, "Failed to mark event read: {}", e);
        }
    }
}
