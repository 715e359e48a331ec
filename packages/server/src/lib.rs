//! Sharecast relay server.
//!
//! A single-task reactor relaying chat messages, private messages and
//! screen-share frames between TCP clients.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
pub mod error;

pub use config::{ConfigError, ServerConfig};
pub use error::ServerError;
pub use ui::Server;
