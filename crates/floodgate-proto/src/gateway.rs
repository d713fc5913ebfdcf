//! Gateway frame envelope and typed dispatch events.
//!
//! Every gateway frame is a JSON object `{op, d, s, t}`. `s` and `t` are
//! only set on dispatch (op 0) frames.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtoError, Result};
use crate::model::{MemberAdd, Message, Ready};

/// Gateway opcodes.
pub mod opcode {
    /// An event was dispatched.
    pub const DISPATCH: u8 = 0;
    /// Keep-alive, sent by either side.
    pub const HEARTBEAT: u8 = 1;
    /// Start a new session.
    pub const IDENTIFY: u8 = 2;
    /// Server asks the client to reconnect.
    pub const RECONNECT: u8 = 7;
    /// The session was invalidated.
    pub const INVALID_SESSION: u8 = 9;
    /// First frame after connecting; carries the heartbeat interval.
    pub const HELLO: u8 = 10;
    /// Server acknowledged a heartbeat.
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// A raw gateway frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayPayload {
    /// Opcode.
    pub op: u8,
    /// Event data.
    #[serde(default)]
    pub d: Value,
    /// Sequence number (dispatch only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    /// Event name (dispatch only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayPayload {
    /// Heartbeat frame carrying the last received sequence number.
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self {
            op: opcode::HEARTBEAT,
            d: last_sequence.map_or(Value::Null, Value::from),
            s: None,
            t: None,
        }
    }

    /// Identify frame for a bot token.
    pub fn identify(token: &str, intents: u64) -> Self {
        let body = Identify {
            token: token.to_string(),
            intents,
            properties: IdentifyProperties::default(),
        };
        Self {
            op: opcode::IDENTIFY,
            d: serde_json::to_value(body).unwrap_or(Value::Null),
            s: None,
            t: None,
        }
    }

    /// Decode `d` as a typed body.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.d.clone())?)
    }

    /// Encode as JSON text.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl FromStr for GatewayPayload {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Body of the HELLO frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    /// Heartbeat period in milliseconds.
    pub heartbeat_interval: u64,
}

/// Body of the IDENTIFY frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identify {
    /// Bot token (without the `Bot ` prefix).
    pub token: String,
    /// Requested gateway intents.
    pub intents: u64,
    /// Client connection properties.
    pub properties: IdentifyProperties,
}

/// Connection properties reported at identify time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyProperties {
    /// Operating system.
    pub os: String,
    /// Library name.
    pub browser: String,
    /// Library name.
    pub device: String,
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: "floodgate".to_string(),
            device: "floodgate".to_string(),
        }
    }
}

/// A decoded dispatch event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Session established.
    Ready(Ready),
    /// A message was posted.
    MessageCreate(Message),
    /// A member joined a guild.
    MemberAdd(MemberAdd),
    /// Any event floodgate does not act on.
    Other(String),
}

impl Event {
    /// Decode the body of a dispatch frame by its event name.
    pub fn from_dispatch(name: &str, d: Value) -> Result<Self> {
        fn decode<T: DeserializeOwned>(name: &str, d: Value) -> Result<T> {
            serde_json::from_value(d).map_err(|source| ProtoError::Payload {
                event: name.to_string(),
                source,
            })
        }

        Ok(match name {
            "READY" => Event::Ready(decode(name, d)?),
            "MESSAGE_CREATE" => Event::MessageCreate(decode(name, d)?),
            "GUILD_MEMBER_ADD" => Event::MemberAdd(decode(name, d)?),
            other => Event::Other(other.to_string()),
        })
    }

    /// Event name as sent on the wire.
    pub fn name(&self) -> &str {
        match self {
            Event::Ready(_) => "READY",
            Event::MessageCreate(_) => "MESSAGE_CREATE",
            Event::MemberAdd(_) => "GUILD_MEMBER_ADD",
            Event::Other(name) => name,
        }
    }
}
