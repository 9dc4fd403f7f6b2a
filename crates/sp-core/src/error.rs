//! Error types for sp-core.
//!
//! The engine itself never fails: bad input degrades to a direct connection.
//! Errors only exist where raw messages are decoded at the boundary.

use thiserror::Error;

/// Errors decoding a control-channel message.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Message is not an object with a string \"type\" field")]
    MissingType,

    #[error("Unknown message type: {0}")]
    UnknownType(String),
}
