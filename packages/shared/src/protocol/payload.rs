//! Grammar of the payload carried inside one envelope.
//!
//! Client to server (after registration):
//! `<sessionId>|<typeTag>|[<command>|]<content>`
//!
//! Server to client:
//! `<typeTag>|<content>`

use thiserror::Error;

use super::types::{Command, MessageType};

/// Field separator inside a decoded payload.
pub const FIELD_SEPARATOR: u8 = b'|';

/// Errors raised while splitting a decoded payload into its fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("missing {0} field")]
    MissingField(&'static str),

    #[error("unknown message type tag {0:?}")]
    UnknownTypeTag(String),

    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("unknown system code {0:?}")]
    UnknownSystemCode(String),

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),
}

/// A client payload split into its raw fields, not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientFrame<'a> {
    pub session_id: &'a [u8],
    pub type_tag: &'a [u8],
    pub body: &'a [u8],
}

/// Split on the first separator; without one the whole input is the head.
fn split_field(input: &[u8]) -> (&[u8], &[u8]) {
    match input.iter().position(|&b| b == FIELD_SEPARATOR) {
        Some(index) => (&input[..index], &input[index + 1..]),
        None => (input, &input[input.len()..]),
    }
}

/// Split a steady-state client payload into session id, type tag and body.
///
/// Only the separator after the session id is mandatory; the body may be
/// empty and, for binary frames, may contain separators of its own.
pub fn split_client_frame(payload: &[u8]) -> Result<ClientFrame<'_>, PayloadError> {
    let Some(index) = payload.iter().position(|&b| b == FIELD_SEPARATOR) else {
        return Err(PayloadError::MissingField("type tag"));
    };
    let session_id = &payload[..index];
    let (type_tag, body) = split_field(&payload[index + 1..]);

    Ok(ClientFrame {
        session_id,
        type_tag,
        body,
    })
}

/// Split a text body into its command token and content.
///
/// `QUIT` and `QUIT|` both yield an empty content.
pub fn split_text_command(body: &[u8]) -> (&[u8], &[u8]) {
    split_field(body)
}

/// Build a text command payload as a client sends it.
pub fn build_text_frame(session_id: &str, command: Command, content: &str) -> Vec<u8> {
    format!(
        "{}|{}|{}|{}",
        session_id,
        MessageType::Text.tag(),
        command.as_str(),
        content
    )
    .into_bytes()
}

/// Build a binary frame payload as a sharer sends it.
pub fn build_binary_frame(session_id: &str, frame: &[u8]) -> Vec<u8> {
    let mut payload = format!("{}|{}|", session_id, MessageType::Binary.tag()).into_bytes();
    payload.extend_from_slice(frame);
    payload
}

/// Build a server-to-client payload.
pub fn build_server_payload(message_type: MessageType, content: &[u8]) -> Vec<u8> {
    let tag = message_type.tag().as_bytes();
    let mut payload = Vec::with_capacity(tag.len() + 1 + content.len());
    payload.extend_from_slice(tag);
    payload.push(FIELD_SEPARATOR);
    payload.extend_from_slice(content);
    payload
}

/// Split a server-to-client payload into its type and content.
pub fn split_server_payload(payload: &[u8]) -> Result<(MessageType, &[u8]), PayloadError> {
    let Some(index) = payload.iter().position(|&b| b == FIELD_SEPARATOR) else {
        return Err(PayloadError::MissingField("content"));
    };
    let message_type = MessageType::from_tag(&payload[..index])?;
    Ok((message_type, &payload[index + 1..]))
}
