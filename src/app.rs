//! Process-level wiring for an embedding binary.
//!
//! The binary supplies the two transports and calls [`run`]:
//!
//! ```ignore
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     lobby_bridge::app::init_tracing();
//!     let (room, room_events) = my_room_transport().await?;
//!     lobby_bridge::app::run(room, room_events, Arc::new(MyLobbyConnector)).await
//! }
//! ```

use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::bridge::channels::ChannelBundle;
use crate::bridge::service::BridgeService;
use crate::common::error::AppError;
use crate::config::env::get_config_path;
use crate::config::types::Config;
use crate::config::load_and_validate;
use crate::lobby::client::LobbyConnector;
use crate::room::adapter::RawRoomEvent;
use crate::room::intent::RoomIntent;

/// Install the fmt subscriber, filtered by `RUST_LOG` with an `info` floor.
pub fn init_tracing() {
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
    if let Err(e) = result {
        debug!("Tracing subscriber already installed: {}", e);
    }
}

/// Load configuration and run the bridge until Ctrl+C / SIGTERM.
pub async fn run(
    room: Arc<dyn RoomIntent>,
    room_events: mpsc::UnboundedReceiver<RawRoomEvent>,
    connector: Arc<dyn LobbyConnector>,
) -> Result<()> {
    info!("Lobby bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);
    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        AppError::from(e)
    })?;

    info!("Configuration loaded successfully");
    info!("  Homeserver: {}", config.homeserver.domain);
    info!("  Bot: {}", config.appservice.bot_username);
    info!("  Namespace: {}_", config.appservice.namespace);
    info!("  Lobby: {}:{} (tls: {})", config.lobby.host, config.lobby.port, config.lobby.tls);
    info!(
        "  Channels: {} bound, {} enabled",
        config.bridge.rooms.len(),
        config.enabled_channels().len()
    );

    run_with_config(config, room, room_events, connector).await
}

/// Run the bridge with an already validated configuration.
pub async fn run_with_config(
    config: Config,
    room: Arc<dyn RoomIntent>,
    room_events: mpsc::UnboundedReceiver<RawRoomEvent>,
    connector: Arc<dyn LobbyConnector>,
) -> Result<()> {
    let channels = ChannelBundle::new();
    let service = BridgeService::new(
        &config,
        room,
        room_events,
        connector,
        channels.session,
        channels.service,
    );

    let shutdown_tx = channels.control.shutdown_tx;
    tokio::spawn(async move {
        shutdown_signal().await;
        if shutdown_tx.send(true).is_err() {
            debug!("Bridge already stopped");
        }
    });

    service.run().await.map_err(|e| {
        error!("Bridge stopped: {}", e);
        AppError::from(e)
    })?;

    info!("Goodbye!");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
