//! Shared building blocks for the Sharecast relay server and client.
//!
//! - `protocol`: the length-prefixed base64 envelope and the payload grammar
//!   carried inside it
//! - `logger`: tracing subscriber setup for the binaries
//! - `time`: clock abstraction and `HH:MM` rendering

pub mod logger;
pub mod protocol;
pub mod time;
