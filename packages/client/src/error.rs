//! Error types for the Sharecast client.

use std::io;

use sharecast_shared::protocol::{FrameFormatError, PayloadError};
use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Socket-level failure
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),

    /// The server closed the connection before replying with a session id
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// The server sent an envelope that could not be decoded
    #[error("Malformed frame from server: {0}")]
    Frame(#[from] FrameFormatError),

    /// The server sent a payload that does not follow the grammar
    #[error("Malformed payload from server: {0}")]
    Payload(#[from] PayloadError),

    /// Capture or render collaborator failure
    #[error("Collaborator error: {0}")]
    Collaborator(String),
}

impl ClientError {
    /// Whether reconnecting could help.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
