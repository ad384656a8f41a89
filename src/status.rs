//! User-visible status notifications

use tracing::info;

/// Sink for status messages and peer lifecycle callbacks
pub trait StatusReporter: Send + Sync {
    /// Show a short notification
    fn report_status(&self, message: &str);

    /// A peer connection was accepted
    fn on_peer_connected(&self) {}

    /// The active peer went away
    fn on_peer_disconnected(&self) {}
}

/// Reporter that writes everything to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report_status(&self, message: &str) {
        info!("[STATUS] {}", message);
    }

    fn on_peer_connected(&self) {
        info!("[STATUS] Peer connected");
    }

    fn on_peer_disconnected(&self) {
        info!("[STATUS] Peer disconnected");
    }
}
