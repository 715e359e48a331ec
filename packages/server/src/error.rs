//! Server-level errors.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop the server itself.
///
/// Per-session failures never surface here; they end in a rejection notice
/// or a teardown of that one session.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}
