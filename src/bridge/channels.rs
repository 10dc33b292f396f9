//! Bridge channel management.
//!
//! Groups the internal channels between the lobby session manager, the
//! service loop and the process-level shutdown handling.

use tokio::sync::{mpsc, watch};

use crate::lobby::session::SessionNotice;

/// Channels for the lobby session manager.
pub struct SessionChannels {
    /// Sender for session lifecycle notices (available / reconnected).
    pub notice_tx: mpsc::UnboundedSender<SessionNotice>,
    /// Receiver for shutdown signal (aborts retry waits).
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Channels for the service loop.
pub struct ServiceChannels {
    /// Receiver for session lifecycle notices.
    pub notice_rx: mpsc::UnboundedReceiver<SessionNotice>,
    /// Receiver for shutdown signal.
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Control channels for shutdown coordination.
pub struct ControlChannels {
    /// Sender to trigger shutdown.
    pub shutdown_tx: watch::Sender<bool>,
}

/// Bundle of all channels created by the bridge.
pub struct ChannelBundle {
    pub session: SessionChannels,
    pub service: ServiceChannels,
    pub control: ControlChannels,
}

impl ChannelBundle {
    pub fn new() -> Self {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            session: SessionChannels {
                notice_tx,
                shutdown_rx: shutdown_rx.clone(),
            },
            service: ServiceChannels {
                notice_rx,
                shutdown_rx,
            },
            control: ControlChannels { shutdown_tx },
        }
    }
}

impl Default for ChannelBundle {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once shutdown has been requested.
///
/// If the sender is gone without ever requesting shutdown, this never resolves.
pub async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    let closed = shutdown_rx.wait_for(|stop| *stop).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
