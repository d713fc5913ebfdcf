//! Lifecycle management state and behavior.
//!
//! Owns the shutdown broadcast that every background task listens on.

use tokio::sync::broadcast;

/// Shutdown signaling for the bot's background tasks.
pub struct LifecycleManager {
    /// Shutdown signal broadcaster.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        // Capacity 16 provides buffer for multiple slow subscribers during shutdown
        let (shutdown_tx, _) = broadcast::channel(16);
        Self { shutdown_tx }
    }

    /// A receiver that fires once shutdown begins.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal every subscriber. Returns how many were listening.
    pub fn shutdown(&self) -> usize {
        self.shutdown_tx.send(()).unwrap_or(0)
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
