//! Gateway - WebSocket client for the Discord event stream.
//!
//! One session: connect, wait for HELLO, IDENTIFY, then heartbeat on the
//! advertised interval while dispatch frames are decoded and handed to the
//! [`EventSink`]. [`GatewayClient::run`] reconnects dropped sessions until
//! shutdown or a fatal close code.

use futures_util::{SinkExt, StreamExt};
use floodgate_proto::{Event, GatewayPayload, Hello, intents, opcode};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tracing::{debug, error, info, instrument, warn};

use super::EventSink;
use crate::config::{ApiConfig, BotToken};
use crate::error::GatewayError;

/// Close code reported when the stream ends without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

/// Why a session ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The gateway asked us to reconnect (op 7).
    Reconnect,
    /// The session was invalidated (op 9); a fresh IDENTIFY is needed.
    InvalidSession,
}

/// Discord gateway client.
pub struct GatewayClient {
    url: String,
    token: BotToken,
    intents: u64,
    reconnect_delay: Duration,
}

impl GatewayClient {
    /// Client for `config.gateway_url` requesting the moderation intents.
    pub fn new(config: &ApiConfig, token: BotToken) -> Self {
        Self {
            url: config.gateway_url.clone(),
            token,
            intents: intents::MODERATION,
            reconnect_delay: config.reconnect_delay(),
        }
    }

    /// Override the requested intents.
    pub fn with_intents(mut self, intents: u64) -> Self {
        self.intents = intents;
        self
    }

    /// Run sessions until `shutdown` fires or the gateway rejects us for good.
    ///
    /// Returns `Ok` on shutdown and the fatal error otherwise.
    #[instrument(skip_all, name = "gateway")]
    pub async fn run(
        self,
        sink: Arc<dyn EventSink>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), GatewayError> {
        loop {
            let outcome = tokio::select! {
                outcome = self.session(&sink) => outcome,
                _ = shutdown.recv() => {
                    info!("Gateway client stopping");
                    return Ok(());
                }
            };

            match outcome {
                Ok(end) => info!(?end, "Gateway session ended, reconnecting"),
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Gateway rejected the session");
                    return Err(e);
                }
                Err(e) => warn!(error = %e, "Gateway session dropped"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = shutdown.recv() => {
                    info!("Gateway client stopping");
                    return Ok(());
                }
            }
        }
    }

    /// One connection from connect to close.
    pub async fn session(&self, sink: &Arc<dyn EventSink>) -> Result<SessionEnd, GatewayError> {
        let (ws, _) = connect_async(self.url.as_str()).await?;
        let (mut tx, mut rx) = ws.split();
        debug!(url = %self.url, "Gateway connected");

        let hello = loop {
            match rx.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    let payload: GatewayPayload = text.parse()?;
                    if payload.op == opcode::HELLO {
                        break payload.data::<Hello>()?;
                    }
                    debug!(op = payload.op, "Ignoring frame before HELLO");
                }
                Some(Ok(WsMessage::Close(frame))) => return Err(closed(frame)),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Err(GatewayError::NoHello),
            }
        };

        let identify = GatewayPayload::identify(self.token.expose(), self.intents);
        tx.send(WsMessage::Text(identify.to_json()?)).await?;

        let period = Duration::from_millis(hello.heartbeat_interval.max(1));
        // First beat lands at a random point of the first period
        let jitter = rand::thread_rng().gen_range(0.0..1.0);
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period.mul_f64(jitter), period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(interval_ms = hello.heartbeat_interval, "Identified, heartbeating");

        let mut last_sequence: Option<u64> = None;
        let mut acked = true;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if !acked {
                        return Err(GatewayError::ZombieConnection);
                    }
                    acked = false;
                    let beat = GatewayPayload::heartbeat(last_sequence);
                    tx.send(WsMessage::Text(beat.to_json()?)).await?;
                }
                frame = rx.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        let payload: GatewayPayload = text.parse()?;
                        if let Some(seq) = payload.s {
                            last_sequence = Some(seq);
                        }

                        match payload.op {
                            opcode::DISPATCH => dispatch(sink, payload),
                            opcode::HEARTBEAT => {
                                let beat = GatewayPayload::heartbeat(last_sequence);
                                tx.send(WsMessage::Text(beat.to_json()?)).await?;
                            }
                            opcode::HEARTBEAT_ACK => acked = true,
                            opcode::RECONNECT => return Ok(SessionEnd::Reconnect),
                            opcode::INVALID_SESSION => return Ok(SessionEnd::InvalidSession),
                            op => debug!(op, "Ignoring gateway opcode"),
                        }
                    }
                    Some(Ok(WsMessage::Close(frame))) => return Err(closed(frame)),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        return Err(GatewayError::Closed {
                            code: ABNORMAL_CLOSURE,
                            reason: "stream ended".into(),
                        });
                    }
                },
            }
        }
    }
}

/// Decode a dispatch frame and hand it to the sink on its own task.
fn dispatch(sink: &Arc<dyn EventSink>, payload: GatewayPayload) {
    let Some(name) = payload.t else {
        warn!("Dispatch frame without event name");
        return;
    };

    match Event::from_dispatch(&name, payload.d) {
        Ok(Event::Other(_)) => {}
        Ok(event) => {
            let sink = Arc::clone(sink);
            tokio::spawn(async move {
                sink.dispatch(event).await;
            });
        }
        Err(e) => warn!(event = %name, error = %e, "Dropping undecodable event"),
    }
}

fn closed(frame: Option<CloseFrame<'_>>) -> GatewayError {
    match frame {
        Some(frame) => GatewayError::Closed {
            code: u16::from(frame.code),
            reason: frame.reason.into_owned(),
        },
        None => GatewayError::Closed {
            code: ABNORMAL_CLOSURE,
            reason: String::new(),
        },
    }
}
