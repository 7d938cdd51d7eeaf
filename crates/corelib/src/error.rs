//! Error types for the core library.

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Error)]
pub enum Error {
    /// A message could not be encoded for the wire.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
    /// An inbound datagram could not be decoded as a message.
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),
    /// A record-source line was not a JSON object.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}
