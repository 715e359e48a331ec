//! Command dispatcher.
//!
//! Turns one decoded client payload into state changes and queued replies.
//! Validation runs in a fixed order (session id, type tag, command) and the
//! first failure short-circuits into an `Error: ...` notice for the sender
//! only. Nothing here can take the server down and no rejection closes the
//! sender's connection.

use std::str::{self, FromStr};

use sharecast_shared::protocol::{
    Command, FrameFormatError, MessageType, PayloadError, split_client_frame, split_text_command,
};

use crate::domain::{ConnectionId, SessionId};

use super::{
    chat,
    error::{DispatchError, ProtocolViolation},
    moderation, screen_share,
    state::{CloseReason, Departure, RelayState},
};

/// A validated client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    Command { command: Command, content: &'a str },
    Frame(&'a [u8]),
}

/// Validate a payload against the session that owns the connection.
pub fn parse_request<'a>(
    session_id: &SessionId,
    payload: &'a [u8],
) -> Result<Request<'a>, DispatchError> {
    let frame = split_client_frame(payload)?;
    if !session_id.matches(frame.session_id) {
        return Err(ProtocolViolation::SessionMismatch.into());
    }

    match MessageType::from_tag(frame.type_tag)? {
        MessageType::Binary => Ok(Request::Frame(frame.body)),
        MessageType::System => Err(ProtocolViolation::SystemFromClient.into()),
        MessageType::Text => {
            let (token, content) = split_text_command(frame.body);
            let token = str::from_utf8(token).map_err(|_| PayloadError::InvalidUtf8("command"))?;
            let command = Command::from_str(token)?;
            let content =
                str::from_utf8(content).map_err(|_| PayloadError::InvalidUtf8("content"))?;
            Ok(Request::Command { command, content })
        }
    }
}

/// Handle one payload from a registered connection.
///
/// Returns the sessions that must be closed as a result (QUIT, KICK_USER).
/// They are already removed from the registry; the caller only has to flush
/// and drop their sockets.
pub fn dispatch(state: &mut RelayState, from: ConnectionId, payload: &[u8]) -> Vec<Departure> {
    let Some(session) = state.registry().lookup(from) else {
        tracing::warn!("Payload from unregistered {}, ignoring", from);
        return Vec::new();
    };

    let request = parse_request(session.id(), payload);
    match request.and_then(|request| execute(state, from, request)) {
        Ok(departures) => departures,
        Err(error) => {
            reject(state, from, &error);
            Vec::new()
        }
    }
}

/// Tell the sender its frame could not be decoded. The connection stays open.
pub fn reject_malformed(state: &mut RelayState, from: ConnectionId, error: FrameFormatError) {
    reject(state, from, &DispatchError::FrameFormat(error));
}

fn execute(
    state: &mut RelayState,
    from: ConnectionId,
    request: Request<'_>,
) -> Result<Vec<Departure>, DispatchError> {
    let (command, content) = match request {
        Request::Frame(frame) => {
            screen_share::relay_frame(state, from, frame);
            return Ok(Vec::new());
        }
        Request::Command { command, content } => (command, content),
    };

    tracing::debug!("{} -> {}", from, command);
    match command {
        Command::SendMessage => chat::send_message(state, from, content)?,
        Command::ChangeName => chat::change_name(state, from, content)?,
        Command::SendPrivateMessage => chat::send_private_message(state, from, content)?,
        Command::ChangeStatus => moderation::change_status(state, from, content)?,
        Command::KickUser => {
            return Ok(moderation::kick_user(state, from, content)?
                .into_iter()
                .collect());
        }
        Command::StartShareScreen => screen_share::start_stream(state, from)?,
        Command::EndShareScreen => screen_share::end_stream(state, from)?,
        Command::JoinShareScreen => screen_share::join_stream(state, from, content)?,
        Command::LeaveShareScreen => screen_share::leave_stream(state, from)?,
        Command::Quit => return Ok(state.teardown(from, CloseReason::Quit).into_iter().collect()),
    }
    Ok(Vec::new())
}

fn reject(state: &mut RelayState, to: ConnectionId, error: &DispatchError) {
    tracing::warn!("Rejected request from {} ({}): {}", to, error.kind(), error);
    state.send_notice(to, format!("Error: {}", error));
}
