//! Bridge router: translates one network's events into the other network's
//! commands.
//!
//! Lobby users appear in rooms as puppets; room users appear on the lobby as
//! bridged clients. Every path checks the tracker first, so replayed or
//! duplicated events never produce a second externally visible change.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::bridge::context::BridgeContext;
use crate::bridge::filter::FilterDirection;
use crate::bridge::registry::ChannelBinding;
use crate::bridge::state::{Departure, MembershipTracker, UserInfoCache};
use crate::bridge::sync::{MembershipSync, SyncReport};
use crate::bridge::text::lobby_lines;
use crate::identity::UserId;
use crate::lobby::events::LobbyEvent;
use crate::lobby::session::BridgeSession;
use crate::room::adapter::{MessageContent, RoomEvent};
use crate::room::media::download_url;

/// Chat line flavour on either network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChatKind {
    Plain,
    Emote,
}

pub struct Router {
    ctx: Arc<BridgeContext>,
    tracker: MembershipTracker,
    syncs: u32,
}

impl Router {
    pub fn new(ctx: Arc<BridgeContext>) -> Self {
        Self {
            ctx,
            tracker: MembershipTracker::new(),
            syncs: 0,
        }
    }

    pub fn context(&self) -> &BridgeContext {
        &self.ctx
    }

    pub fn tracker(&self) -> &MembershipTracker {
        &self.tracker
    }

    /// Reconcile both sides for a freshly established session.
    pub async fn synchronize(&mut self, session: &BridgeSession) -> SyncReport {
        let initial = self.syncs == 0;
        self.syncs += 1;
        MembershipSync::new(&self.ctx, &mut self.tracker)
            .run(session, initial)
            .await
    }

    // Lobby -> room

    pub async fn handle_lobby_event(&mut self, event: LobbyEvent) {
        match event {
            LobbyEvent::Clients { channel, users } => {
                debug!(channel = %channel, count = users.len(), "Mirroring channel clients");
                for user in users {
                    self.on_lobby_joined(&channel, &user).await;
                }
            }
            LobbyEvent::Joined { channel, user } => self.on_lobby_joined(&channel, &user).await,
            LobbyEvent::Left { channel, user } => self.on_lobby_left(&channel, &user).await,
            LobbyEvent::Said { channel, user, text } => {
                self.on_lobby_said(&channel, &user, &text, ChatKind::Plain).await
            }
            LobbyEvent::SaidEx { channel, user, text } => {
                self.on_lobby_said(&channel, &user, &text, ChatKind::Emote).await
            }
            LobbyEvent::AddUser { user } => {
                // Puppets are only created on a join into an enabled binding.
                debug!(user = %user, "Lobby user online");
            }
            LobbyEvent::RemoveUser { user } => self.on_lobby_user_removed(&user).await,
            LobbyEvent::Accepted { .. } | LobbyEvent::Failed { .. } => {
                debug!("Ignoring '{}' outside of login", event.kind());
            }
        }
    }

    /// Binding for a lobby event, or `None` if the event must be dropped.
    fn lobby_binding(&self, channel: &str, user: &str) -> Option<ChannelBinding> {
        if self.ctx.is_excluded_lobby_user(user) {
            debug!(user = %user, channel = %channel, "Ignoring own or ignored lobby user");
            return None;
        }
        let binding = self.ctx.registry.enabled_by_channel(channel).cloned();
        if binding.is_none() {
            debug!(channel = %channel, "Channel not bridged or disabled");
        }
        binding
    }

    async fn on_lobby_joined(&mut self, channel: &str, user: &str) {
        let Some(binding) = self.lobby_binding(channel, user) else {
            return;
        };
        if let Some(puppet) = self
            .ctx
            .join_puppet(&mut self.tracker, user, &binding.room_id)
            .await
        {
            debug!(puppet = %puppet, room_id = %binding.room_id, "Lobby user in room");
        }
    }

    async fn on_lobby_left(&mut self, channel: &str, user: &str) {
        let Some(binding) = self.lobby_binding(channel, user) else {
            return;
        };
        let puppet = self.ctx.codec.encode(self.ctx.codec.lobby_network(), user);
        self.leave_puppet(&puppet, &binding.room_id).await;
    }

    async fn on_lobby_said(&mut self, channel: &str, user: &str, text: &str, kind: ChatKind) {
        let Some(binding) = self.lobby_binding(channel, user) else {
            return;
        };
        if self.ctx.filter.should_filter(FilterDirection::LobbyToRoom, text) {
            debug!(channel = %channel, user = %user, "Lobby message filtered");
            return;
        }
        let Some(puppet) = self
            .ctx
            .join_puppet(&mut self.tracker, user, &binding.room_id)
            .await
        else {
            return;
        };

        let result = match kind {
            ChatKind::Plain => self.ctx.room.send_text(&puppet, &binding.room_id, text).await,
            ChatKind::Emote => self.ctx.room.send_emote(&puppet, &binding.room_id, text).await,
        };
        if let Err(e) = result {
            warn!(puppet = %puppet, room_id = %binding.room_id, "Failed to relay lobby message: {}", e);
        }
    }

    async fn on_lobby_user_removed(&mut self, user: &str) {
        if self.ctx.is_excluded_lobby_user(user) {
            return;
        }
        let puppet = self.ctx.codec.encode(self.ctx.codec.lobby_network(), user);
        for room_id in self.tracker.take_puppet_rooms(&puppet) {
            if let Err(e) = self.ctx.room.leave_room(&puppet, &room_id).await {
                warn!(puppet = %puppet, room_id = %room_id, "Failed to remove puppet from room: {}", e);
            }
        }
    }

    async fn leave_puppet(&mut self, puppet: &UserId, room_id: &str) {
        match self.ctx.room.leave_room(puppet, room_id).await {
            Ok(()) => {
                self.tracker.puppet_left(puppet, room_id);
            }
            Err(e) => warn!(puppet = %puppet, room_id = %room_id, "Failed to remove puppet from room: {}", e),
        }
    }

    // Room -> lobby

    pub async fn handle_room_event(&mut self, event: RoomEvent, session: &BridgeSession) {
        match event {
            RoomEvent::MemberJoined {
                room_id,
                event_id,
                user,
            } => self.on_member_joined(&room_id, &event_id, &user, session).await,
            RoomEvent::MemberLeft {
                room_id,
                event_id,
                user,
            } => self.on_member_left(&room_id, &event_id, &user, session).await,
            RoomEvent::PuppetLeft { room_id, user } => {
                if self.tracker.puppet_left(&user, &room_id) {
                    debug!(puppet = %user, room_id = %room_id, "Puppet left room");
                }
            }
            RoomEvent::Message {
                room_id,
                event_id,
                sender,
                content,
            } => {
                self.on_message(&room_id, &event_id, &sender, content, session)
                    .await
            }
        }
    }

    /// Binding for a room event, or `None` if the event must be dropped.
    fn room_binding(&self, room_id: &str, user: &UserId) -> Option<ChannelBinding> {
        if self.ctx.is_excluded_room_user(user) {
            debug!(user = %user, "Ignoring bridge-owned or ignored room user");
            return None;
        }
        let binding = self.ctx.registry.enabled_by_room(room_id).cloned();
        if binding.is_none() {
            debug!(room_id = %room_id, "Room not bridged or disabled");
        }
        binding
    }

    async fn on_member_joined(
        &mut self,
        room_id: &str,
        event_id: &str,
        user: &UserId,
        session: &BridgeSession,
    ) {
        let Some(binding) = self.room_binding(room_id, user) else {
            return;
        };
        let info = self.ctx.resolve_user(user, &mut UserInfoCache::new()).await;
        if self
            .ctx
            .bridge_member(&mut self.tracker, session.client().as_ref(), &info, &binding.channel)
            .await
        {
            info!(user = %user, channel = %binding.channel, "Room member bridged to lobby");
            self.ctx.mark_read(room_id, event_id).await;
        }
    }

    async fn on_member_left(
        &mut self,
        room_id: &str,
        event_id: &str,
        user: &UserId,
        session: &BridgeSession,
    ) {
        let Some(binding) = self.room_binding(room_id, user) else {
            return;
        };
        let identity = self.ctx.codec.derive(user);
        if !self.tracker.is_client_in(&identity, &binding.channel) {
            debug!(user = %user, channel = %binding.channel, "Departed member was not bridged");
            return;
        }

        let lobby = session.client();
        if let Err(e) = lobby.leave_from(&binding.channel, &identity).await {
            warn!(user = %identity, channel = %binding.channel, "Failed to part bridged client: {}", e);
            return;
        }
        if self.tracker.client_left(&identity, &binding.channel) == Departure::LastChannel {
            if let Err(e) = lobby.un_bridged_client_from(&identity).await {
                warn!(user = %identity, "Failed to un-bridge client: {}", e);
            }
        }
        self.ctx.mark_read(room_id, event_id).await;
    }

    async fn on_message(
        &mut self,
        room_id: &str,
        event_id: &str,
        sender: &UserId,
        content: MessageContent,
        session: &BridgeSession,
    ) {
        let Some(binding) = self.room_binding(room_id, sender) else {
            return;
        };

        let (body, kind) = match content {
            MessageContent::Text(body) => (body, ChatKind::Plain),
            MessageContent::Emote(body) => (body, ChatKind::Emote),
            MessageContent::Image { url } | MessageContent::Sticker { url } => {
                match download_url(&url, self.ctx.media_base.as_deref()) {
                    Ok(link) => (link, ChatKind::Plain),
                    Err(e) => {
                        warn!(room_id = %room_id, "Dropping media message: {}", e);
                        return;
                    }
                }
            }
            MessageContent::Unsupported { msgtype } => {
                debug!(room_id = %room_id, msgtype = %msgtype, "Dropping unsupported message type");
                return;
            }
        };
        if self.ctx.filter.should_filter(FilterDirection::RoomToLobby, &body) {
            debug!(room_id = %room_id, sender = %sender, "Room message filtered");
            return;
        }
        let lines = lobby_lines(&body, self.ctx.max_line_length);
        if lines.is_empty() {
            return;
        }

        let lobby = session.client();
        let info = self.ctx.resolve_user(sender, &mut UserInfoCache::new()).await;
        if !self
            .ctx
            .bridge_member(&mut self.tracker, lobby.as_ref(), &info, &binding.channel)
            .await
        {
            return;
        }

        let identity = info.identity();
        for line in &lines {
            let result = match kind {
                ChatKind::Plain => lobby.say_from(&binding.channel, &identity, line).await,
                ChatKind::Emote => lobby.say_ex_from(&binding.channel, &identity, line).await,
            };
            if let Err(e) = result {
                warn!(user = %identity, channel = %binding.channel, "Failed to relay room message: {}", e);
                return;
            }
        }
        self.ctx.mark_read(room_id, event_id).await;
    }
}
