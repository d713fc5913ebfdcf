//! Error types for the Discord protocol library.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtoError`].
pub type Result<T, E = ProtoError> = std::result::Result<T, E>;

/// Errors raised while decoding Discord ids and payloads.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// A snowflake id was not a decimal `u64`.
    #[error("invalid snowflake: {0:?}")]
    InvalidSnowflake(String),

    /// A gateway frame could not be decoded at all.
    #[error("malformed gateway frame: {0}")]
    Frame(#[from] serde_json::Error),

    /// A dispatch event carried a body that does not match its type.
    #[error("malformed {event} payload: {source}")]
    Payload {
        /// Dispatch event name (`t` field).
        event: String,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
}
