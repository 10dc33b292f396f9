//! Recording doubles for the transport seams.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::bridge::channels::ChannelBundle;
use crate::bridge::context::BridgeContext;
use crate::common::error::{ConnectionError, TransportError, TransportResult};
use crate::common::types::RemoteIdentity;
use crate::config::tests::make_test_config;
use crate::identity::UserId;
use crate::lobby::client::{LobbyClient, LobbyConnector, LobbyEndpoint, LobbyLink};
use crate::lobby::events::LobbyEvent;
use crate::lobby::session::{BridgeSession, SessionManager};
use crate::room::intent::RoomIntent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCall {
    Register { user: String },
    SetDisplayname { user: String, name: String },
    JoinRoom { user: String, room_id: String },
    LeaveRoom { user: String, room_id: String },
    SendText { user: String, room_id: String, text: String },
    SendEmote { user: String, room_id: String, text: String },
    MarkRead { user: String, room_id: String, event_id: String },
}

/// Room transport double. Lookups are answered from configured maps.
#[derive(Default)]
pub struct MockRoom {
    calls: StdMutex<Vec<RoomCall>>,
    members: StdMutex<HashMap<String, Vec<UserId>>>,
    displaynames: StdMutex<HashMap<String, String>>,
    failing_lookups: StdMutex<HashSet<String>>,
    fail_mark_read: StdMutex<bool>,
}

impl MockRoom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_members(&self, room_id: &str, members: &[&str]) {
        let members = members.iter().map(|m| m.parse().unwrap()).collect();
        self.members.lock().unwrap().insert(room_id.to_string(), members);
    }

    pub fn set_displayname_of(&self, user: &str, name: &str) {
        self.displaynames
            .lock()
            .unwrap()
            .insert(user.to_string(), name.to_string());
    }

    pub fn fail_lookup_of(&self, user: &str) {
        self.failing_lookups.lock().unwrap().insert(user.to_string());
    }

    pub fn fail_mark_read(&self) {
        *self.fail_mark_read.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<RoomCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: RoomCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RoomIntent for MockRoom {
    async fn register(&self, user: &UserId) -> TransportResult<()> {
        self.record(RoomCall::Register {
            user: user.to_string(),
        });
        Ok(())
    }

    async fn set_displayname(&self, user: &UserId, name: &str) -> TransportResult<()> {
        self.record(RoomCall::SetDisplayname {
            user: user.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn get_displayname(&self, user: &UserId) -> TransportResult<Option<String>> {
        let key = user.to_string();
        if self.failing_lookups.lock().unwrap().contains(&key) {
            return Err(TransportError::NotFound { what: key });
        }
        Ok(self.displaynames.lock().unwrap().get(&key).cloned())
    }

    async fn join_room(&self, user: &UserId, room_id: &str) -> TransportResult<()> {
        self.record(RoomCall::JoinRoom {
            user: user.to_string(),
            room_id: room_id.to_string(),
        });
        Ok(())
    }

    async fn leave_room(&self, user: &UserId, room_id: &str) -> TransportResult<()> {
        self.record(RoomCall::LeaveRoom {
            user: user.to_string(),
            room_id: room_id.to_string(),
        });
        Ok(())
    }

    async fn send_text(&self, user: &UserId, room_id: &str, text: &str) -> TransportResult<()> {
        self.record(RoomCall::SendText {
            user: user.to_string(),
            room_id: room_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_emote(&self, user: &UserId, room_id: &str, text: &str) -> TransportResult<()> {
        self.record(RoomCall::SendEmote {
            user: user.to_string(),
            room_id: room_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn get_room_members(&self, room_id: &str) -> TransportResult<Vec<UserId>> {
        self.members
            .lock()
            .unwrap()
            .get(room_id)
            .cloned()
            .ok_or_else(|| TransportError::NotFound {
                what: room_id.to_string(),
            })
    }

    async fn mark_read(&self, user: &UserId, room_id: &str, event_id: &str) -> TransportResult<()> {
        self.record(RoomCall::MarkRead {
            user: user.to_string(),
            room_id: room_id.to_string(),
            event_id: event_id.to_string(),
        });
        if *self.fail_mark_read.lock().unwrap() {
            return Err(TransportError::Unavailable);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyCall {
    Login { username: String },
    Join { channel: String },
    Bridged { identity: RemoteIdentity, display_name: String },
    UnBridged { identity: RemoteIdentity },
    JoinFrom { channel: String, identity: RemoteIdentity },
    LeaveFrom { channel: String, identity: RemoteIdentity },
    Say { channel: String, identity: RemoteIdentity, text: String },
    SayEx { channel: String, identity: RemoteIdentity, text: String },
}

/// Lobby transport double that records every command.
#[derive(Default)]
pub struct MockLobby {
    calls: StdMutex<Vec<LobbyCall>>,
}

impl MockLobby {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<LobbyCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: LobbyCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl LobbyClient for MockLobby {
    async fn login(&self, username: &str, _password: &str) -> TransportResult<()> {
        self.record(LobbyCall::Login {
            username: username.to_string(),
        });
        Ok(())
    }

    async fn join(&self, channel: &str) -> TransportResult<()> {
        self.record(LobbyCall::Join {
            channel: channel.to_string(),
        });
        Ok(())
    }

    async fn bridged_client_from(&self, identity: &RemoteIdentity, display_name: &str) -> TransportResult<()> {
        self.record(LobbyCall::Bridged {
            identity: identity.clone(),
            display_name: display_name.to_string(),
        });
        Ok(())
    }

    async fn un_bridged_client_from(&self, identity: &RemoteIdentity) -> TransportResult<()> {
        self.record(LobbyCall::UnBridged {
            identity: identity.clone(),
        });
        Ok(())
    }

    async fn join_from(&self, channel: &str, identity: &RemoteIdentity) -> TransportResult<()> {
        self.record(LobbyCall::JoinFrom {
            channel: channel.to_string(),
            identity: identity.clone(),
        });
        Ok(())
    }

    async fn leave_from(&self, channel: &str, identity: &RemoteIdentity) -> TransportResult<()> {
        self.record(LobbyCall::LeaveFrom {
            channel: channel.to_string(),
            identity: identity.clone(),
        });
        Ok(())
    }

    async fn say_from(&self, channel: &str, identity: &RemoteIdentity, text: &str) -> TransportResult<()> {
        self.record(LobbyCall::Say {
            channel: channel.to_string(),
            identity: identity.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn say_ex_from(&self, channel: &str, identity: &RemoteIdentity, text: &str) -> TransportResult<()> {
        self.record(LobbyCall::SayEx {
            channel: channel.to_string(),
            identity: identity.clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}

/// Scripted connector. Each attempt consumes one scripted outcome; once the
/// script runs out every attempt is refused.
#[derive(Default)]
pub struct MockConnector {
    script: StdMutex<VecDeque<Option<LobbyLink>>>,
    attempts: StdMutex<Vec<Instant>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self) {
        self.script.lock().unwrap().push_back(None);
    }

    /// Queue a connection whose login will be accepted. The returned sender
    /// feeds further events; dropping it closes the connection.
    pub fn accept(&self, client: Arc<MockLobby>) -> mpsc::UnboundedSender<LobbyEvent> {
        self.queue(client, LobbyEvent::Accepted {
            user: "appservice".to_string(),
        })
    }

    /// Queue a connection whose login will be denied.
    pub fn deny(&self, client: Arc<MockLobby>, reason: &str) -> mpsc::UnboundedSender<LobbyEvent> {
        self.queue(client, LobbyEvent::Failed {
            reason: reason.to_string(),
        })
    }

    fn queue(&self, client: Arc<MockLobby>, verdict: LobbyEvent) -> mpsc::UnboundedSender<LobbyEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(verdict).unwrap();
        self.script.lock().unwrap().push_back(Some(LobbyLink { client, events: rx }));
        tx
    }

    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LobbyConnector for MockConnector {
    async fn connect(&self, endpoint: &LobbyEndpoint) -> Result<LobbyLink, ConnectionError> {
        self.attempts.lock().unwrap().push(Instant::now());
        match self.script.lock().unwrap().pop_front() {
            Some(Some(link)) => Ok(link),
            _ => Err(ConnectionError::Refused {
                host: endpoint.host.clone(),
                port: endpoint.port,
            }),
        }
    }
}

/// Bridge context over the shared test config and a mock room transport.
pub fn test_context(room: Arc<MockRoom>) -> Arc<BridgeContext> {
    Arc::new(BridgeContext::from_config(&make_test_config(), room))
}

/// An active session on a mock lobby, with login traffic already cleared.
///
/// The returned sender keeps the connection open.
pub async fn connected_session(lobby: Arc<MockLobby>) -> (BridgeSession, mpsc::UnboundedSender<LobbyEvent>) {
    let connector = Arc::new(MockConnector::new());
    let events_tx = connector.accept(lobby.clone());
    let bundle = ChannelBundle::new();
    let mut manager = SessionManager::new(&make_test_config(), connector, bundle.session);
    let session = manager.connect().await.unwrap();
    lobby.clear();
    (session, events_tx)
}
