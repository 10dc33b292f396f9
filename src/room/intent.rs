//! Seam to the room transport.

use async_trait::async_trait;

use crate::common::error::TransportResult;
use crate::identity::UserId;

/// Actions on the room network, performed as a given user.
///
/// The transport owns puppet provisioning; `user` may be the bridge bot or any
/// id inside the bridge namespace.
#[async_trait]
pub trait RoomIntent: Send + Sync {
    /// Make sure the user exists on the homeserver.
    async fn register(&self, user: &UserId) -> TransportResult<()>;

    async fn set_displayname(&self, user: &UserId, name: &str) -> TransportResult<()>;

    /// `Ok(None)` when the user has no display name set.
    async fn get_displayname(&self, user: &UserId) -> TransportResult<Option<String>>;

    async fn join_room(&self, user: &UserId, room_id: &str) -> TransportResult<()>;

    async fn leave_room(&self, user: &UserId, room_id: &str) -> TransportResult<()>;

    async fn send_text(&self, user: &UserId, room_id: &str, text: &str) -> TransportResult<()>;

    async fn send_emote(&self, user: &UserId, room_id: &str, text: &str) -> TransportResult<()>;

    /// Currently joined members of a room.
    async fn get_room_members(&self, room_id: &str) -> TransportResult<Vec<UserId>>;

    async fn mark_read(&self, user: &UserId, room_id: &str, event_id: &str) -> TransportResult<()>;
}
