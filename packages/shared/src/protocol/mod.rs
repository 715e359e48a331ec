//! Sharecast wire protocol.

pub mod codec;
pub mod payload;
pub mod types;

pub use codec::{FrameDecoder, FrameFormatError, encode};
pub use payload::{
    ClientFrame, PayloadError, build_binary_frame, build_server_payload, build_text_frame,
    split_client_frame, split_server_payload, split_text_command,
};
pub use types::{Command, MessageType, SystemCode};
