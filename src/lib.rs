//! Lobby bridge - mirrors chat between a room-based network and a SpringRTS
//! style lobby server.
//!
//! Room users appear on the lobby as bridged clients; lobby users appear in
//! rooms as puppets. The two transports are supplied by the embedding binary
//! through [`room::RoomIntent`] and [`lobby::LobbyConnector`].

pub mod app;
pub mod bridge;
pub mod common;
pub mod config;
pub mod identity;
pub mod lobby;
pub mod room;

#[cfg(test)]
mod testing;
