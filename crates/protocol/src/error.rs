//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding or encoding messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Empty message frame")]
    EmptyMessage,

    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}
