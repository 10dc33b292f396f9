//! Normalizes raw room transport events into [`RoomEvent`]s.
//!
//! The adapter is the first anti-echo gate: anything sent by the bridge bot, a
//! bridge puppet or an ignored relay bot is dropped here. The only puppet
//! events that pass are departures, which the router needs to keep its
//! membership view honest.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::common::types::{EventId, RoomId};
use crate::identity::{IdentityCodec, UserId};

pub const MEMBER_EVENT: &str = "m.room.member";
pub const MESSAGE_EVENT: &str = "m.room.message";
pub const STICKER_EVENT: &str = "m.sticker";

/// A room event as delivered by the transport.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRoomEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub room_id: RoomId,
    #[serde(default)]
    pub event_id: EventId,
    pub sender: String,
    #[serde(default)]
    pub state_key: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub unsigned: Value,
}

impl RawRoomEvent {
    fn membership(&self) -> Option<&str> {
        self.content.get("membership").and_then(Value::as_str)
    }

    fn prev_membership(&self) -> Option<&str> {
        self.unsigned
            .get("prev_content")
            .and_then(|prev| prev.get("membership"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Emote(String),
    Image { url: String },
    Sticker { url: String },
    Unsupported { msgtype: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    MemberJoined {
        room_id: RoomId,
        event_id: EventId,
        user: UserId,
    },
    MemberLeft {
        room_id: RoomId,
        event_id: EventId,
        user: UserId,
    },
    /// One of our puppets left or was removed from a room.
    PuppetLeft { room_id: RoomId, user: UserId },
    Message {
        room_id: RoomId,
        event_id: EventId,
        sender: UserId,
        content: MessageContent,
    },
}

/// Membership change carried by a member event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Joined,
    Left,
    Other,
}

fn transition(raw: &RawRoomEvent) -> Transition {
    match raw.membership() {
        Some("join") if raw.prev_membership() != Some("join") => Transition::Joined,
        Some("leave") | Some("ban") => Transition::Left,
        _ => Transition::Other,
    }
}

pub struct RoomEventAdapter {
    codec: IdentityCodec,
    bot_user: UserId,
    ignored_users: Vec<String>,
}

impl RoomEventAdapter {
    pub fn new(codec: IdentityCodec, bot_user: UserId, ignored_users: Vec<String>) -> Self {
        Self {
            codec,
            bot_user,
            ignored_users,
        }
    }

    fn is_ignored(&self, user: &UserId) -> bool {
        self.ignored_users
            .iter()
            .any(|ignored| ignored.eq_ignore_ascii_case(user.localpart()))
    }

    /// Translate a raw event, or `None` if it must not be bridged.
    pub fn normalize(&self, raw: RawRoomEvent) -> Option<RoomEvent> {
        match raw.kind.as_str() {
            MEMBER_EVENT => self.normalize_member(raw),
            MESSAGE_EVENT | STICKER_EVENT => self.normalize_message(raw),
            other => {
                debug!(room_id = %raw.room_id, "Ignoring room event of type {}", other);
                None
            }
        }
    }

    fn normalize_member(&self, raw: RawRoomEvent) -> Option<RoomEvent> {
        let Some(subject) = raw.state_key.as_deref() else {
            debug!(room_id = %raw.room_id, "Member event without state key");
            return None;
        };
        let user: UserId = match subject.parse() {
            Ok(user) => user,
            Err(e) => {
                debug!(room_id = %raw.room_id, "Member event for invalid user: {}", e);
                return None;
            }
        };
        let transition = transition(&raw);

        if user == self.bot_user {
            return None;
        }
        if self.codec.is_bridge_owned(&user) {
            return match transition {
                Transition::Left => Some(RoomEvent::PuppetLeft {
                    room_id: raw.room_id,
                    user,
                }),
                _ => None,
            };
        }
        if self.is_ignored(&user) {
            debug!(user = %user, "Ignoring member event for ignored user");
            return None;
        }

        match transition {
            Transition::Joined => Some(RoomEvent::MemberJoined {
                room_id: raw.room_id,
                event_id: raw.event_id,
                user,
            }),
            Transition::Left => Some(RoomEvent::MemberLeft {
                room_id: raw.room_id,
                event_id: raw.event_id,
                user,
            }),
            Transition::Other => None,
        }
    }

    fn normalize_message(&self, raw: RawRoomEvent) -> Option<RoomEvent> {
        let sender: UserId = match raw.sender.parse() {
            Ok(sender) => sender,
            Err(e) => {
                debug!(room_id = %raw.room_id, "Message from invalid sender: {}", e);
                return None;
            }
        };
        if sender == self.bot_user || self.codec.is_bridge_owned(&sender) || self.is_ignored(&sender) {
            return None;
        }

        let content = parse_content(&raw);
        Some(RoomEvent::Message {
            room_id: raw.room_id,
            event_id: raw.event_id,
            sender,
            content,
        })
    }
}

fn parse_content(raw: &RawRoomEvent) -> MessageContent {
    let body = raw.content.get("body").and_then(Value::as_str);
    let url = raw.content.get("url").and_then(Value::as_str);

    if raw.kind == STICKER_EVENT {
        return match url {
            Some(url) => MessageContent::Sticker {
                url: url.to_string(),
            },
            None => MessageContent::Unsupported {
                msgtype: STICKER_EVENT.to_string(),
            },
        };
    }

    let msgtype = raw
        .content
        .get("msgtype")
        .and_then(Value::as_str)
        .unwrap_or_default();
    match (msgtype, body, url) {
        ("m.text", Some(body), _) => MessageContent::Text(body.to_string()),
        ("m.emote", Some(body), _) => MessageContent::Emote(body.to_string()),
        ("m.image", _, Some(url)) => MessageContent::Image {
            url: url.to_string(),
        },
        _ => MessageContent::Unsupported {
            msgtype: msgtype.to_string(),
        },
    }
}
