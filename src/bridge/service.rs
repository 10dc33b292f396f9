//! The bridge service loop.
//!
//! One loop owns the router, the current lobby session and the room event
//! stream. Each event is handled to completion before the next one is taken,
//! so bridge state needs no locking.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bridge::channels::{wait_for_shutdown, ServiceChannels, SessionChannels};
use crate::bridge::context::BridgeContext;
use crate::bridge::router::Router;
use crate::common::error::SessionError;
use crate::config::types::Config;
use crate::lobby::client::LobbyConnector;
use crate::lobby::session::{SessionManager, SessionNotice};
use crate::room::adapter::{RawRoomEvent, RoomEventAdapter};
use crate::room::intent::RoomIntent;

pub struct BridgeService {
    router: Router,
    adapter: RoomEventAdapter,
    sessions: SessionManager,
    room_events: mpsc::UnboundedReceiver<RawRoomEvent>,
    channels: ServiceChannels,
}

impl BridgeService {
    pub fn new(
        config: &Config,
        room: Arc<dyn RoomIntent>,
        room_events: mpsc::UnboundedReceiver<RawRoomEvent>,
        connector: Arc<dyn LobbyConnector>,
        session_channels: SessionChannels,
        channels: ServiceChannels,
    ) -> Self {
        let ctx = Arc::new(BridgeContext::from_config(config, room));
        Self {
            adapter: ctx.room_adapter(),
            router: Router::new(ctx),
            sessions: SessionManager::new(config, connector, session_channels),
            room_events,
            channels,
        }
    }

    /// Run until shutdown. Only a rejected lobby login ends the loop with an error.
    pub async fn run(mut self) -> Result<(), SessionError> {
        let mut session = match self.sessions.connect().await {
            Ok(session) => session,
            Err(SessionError::Shutdown) => return Ok(()),
            Err(e) => return Err(e),
        };
        let mut shutdown_rx = self.channels.shutdown_rx.clone();

        loop {
            tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut shutdown_rx) => {
                    info!("Shutdown requested, stopping bridge");
                    break;
                }

                Some(notice) = self.channels.notice_rx.recv() => {
                    let key = match &notice {
                        SessionNotice::Available { key } | SessionNotice::Reconnected { key } => key,
                    };
                    if key == session.key() {
                        self.router.synchronize(&session).await;
                    } else {
                        debug!(session = %key, "Ignoring notice for a stale session");
                    }
                }

                event = session.next_event() => match event {
                    Some(event) => self.router.handle_lobby_event(event).await,
                    None => {
                        warn!(session = %session.key(), "Lobby connection lost");
                        session = match self.sessions.reconnect(&session).await {
                            Ok(session) => session,
                            Err(SessionError::Shutdown) => break,
                            Err(e) => return Err(e),
                        };
                    }
                },

                Some(raw) = self.room_events.recv() => {
                    if let Some(event) = self.adapter.normalize(raw) {
                        self.router.handle_room_event(event, &session).await;
                    }
                }
            }
        }

        info!("Bridge stopped");
        Ok(())
    }
}
