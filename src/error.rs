//! Unified error handling for floodgate.
//!
//! Errors are grouped by layer: the in-memory activity core, the REST
//! client, the gateway connection and the event handlers that tie them
//! together. Each carries a static code for metrics labeling.

use floodgate_proto::ProtoError;
use thiserror::Error;

// ============================================================================
// Activity Errors (registry operations)
// ============================================================================

/// Errors from the per-channel activity registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivityError {
    #[error("invalid channel id: {0:?}")]
    InvalidChannelId(String),
}

// ============================================================================
// API Errors (REST calls)
// ============================================================================

/// Errors returned by moderation API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// HTTP 502 from the upstream API; worth retrying.
    #[inline]
    pub fn is_bad_gateway(&self) -> bool {
        matches!(self, Self::Status { status: 502, .. })
    }

    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Status { status: 502, .. } => "bad_gateway",
            Self::Status { status: 403, .. } => "forbidden",
            Self::Status { status: 404, .. } => "not_found",
            Self::Status { status: 429, .. } => "rate_limited",
            Self::Status { .. } => "http_status",
            Self::Transport(_) => "transport",
            Self::Unexpected(_) => "unexpected",
        }
    }
}

// ============================================================================
// Gateway Errors (websocket session)
// ============================================================================

/// Errors that end a gateway session.
#[derive(Debug, Error)]
#[allow(clippy::large_enum_variant)] // WebSocket variant is large but rarely constructed
pub enum GatewayError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),

    #[error("connection closed before HELLO")]
    NoHello,

    #[error("heartbeat was not acknowledged")]
    ZombieConnection,

    #[error("gateway closed the session with code {code}: {reason}")]
    Closed { code: u16, reason: String },
}

impl GatewayError {
    /// Close codes after which reconnecting cannot succeed.
    pub fn is_fatal(&self) -> bool {
        match self {
            // 4004 authentication failed, 4010..=4014 shard/version/intents problems
            Self::Closed { code, .. } => *code == 4004 || (4010..=4014).contains(code),
            _ => false,
        }
    }
}

// ============================================================================
// Handler Errors (event processing)
// ============================================================================

/// Errors that can occur while handling a gateway event.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Activity(#[from] ActivityError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Activity(ActivityError::InvalidChannelId(_)) => "invalid_channel_id",
            Self::Api(e) => e.error_code(),
        }
    }
}

/// Result type for event handlers.
pub type HandlerResult<T = ()> = Result<T, HandlerError>;
