//! Sharecast client library and console client.
//!
//! [`RelayClient`] speaks the relay protocol; the console modules build the
//! interactive `sharecast-client` binary on top of it.

pub mod client;
pub mod collaborator;
pub mod command;
pub mod error;
pub mod event;
pub mod state;

// console
pub mod runner;
pub mod session;
pub mod ui;

pub use client::{CommandSender, EventReceiver, RelayClient};
pub use error::ClientError;
pub use event::ServerEvent;
pub use runner::run_client;
