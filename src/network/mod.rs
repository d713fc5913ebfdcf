//! Network layer for floodgate.
//!
//! Contains the gateway WebSocket client and the seam it delivers decoded
//! events through.

pub mod gateway;

pub use gateway::{GatewayClient, SessionEnd};

use async_trait::async_trait;
use floodgate_proto::Event;

/// Receiver of decoded gateway dispatch events.
///
/// Each event is delivered on its own task, so implementations must not
/// assume ordering between events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn dispatch(&self, event: Event);
}
