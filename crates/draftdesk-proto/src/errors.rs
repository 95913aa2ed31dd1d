//! Protocol error types.

use thiserror::Error;

/// Result alias for wire operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while parsing or encoding frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The text was not a JSON object with a string `type` field.
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A known frame type arrived without its required `data` payload.
    #[error("frame '{kind}' is missing its data payload")]
    MissingData {
        /// Frame type tag
        kind: String,
    },

    /// A known frame type carried a payload of the wrong shape.
    #[error("frame '{kind}' has an invalid payload: {source}")]
    InvalidPayload {
        /// Frame type tag
        kind: String,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },

    /// An outbound frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}
