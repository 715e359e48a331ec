//! Protocol vocabulary: type tags, text commands and system codes.

use std::{fmt, str::FromStr};

use super::payload::PayloadError;

/// Type tag carried in every decoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Human-readable text (`"0"`)
    Text,
    /// Opaque video frame bytes (`"1"`)
    Binary,
    /// Server control codes (`"2"`), never accepted from clients
    System,
}

impl MessageType {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Text => "0",
            Self::Binary => "1",
            Self::System => "2",
        }
    }

    pub fn from_tag(tag: &[u8]) -> Result<Self, PayloadError> {
        match tag {
            b"0" => Ok(Self::Text),
            b"1" => Ok(Self::Binary),
            b"2" => Ok(Self::System),
            other => Err(PayloadError::UnknownTypeTag(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }
}

/// Fixed set of text commands a client may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    SendMessage,
    ChangeName,
    ChangeStatus,
    KickUser,
    SendPrivateMessage,
    StartShareScreen,
    EndShareScreen,
    JoinShareScreen,
    LeaveShareScreen,
    Quit,
}

impl Command {
    pub const ALL: [Command; 10] = [
        Self::SendMessage,
        Self::ChangeName,
        Self::ChangeStatus,
        Self::KickUser,
        Self::SendPrivateMessage,
        Self::StartShareScreen,
        Self::EndShareScreen,
        Self::JoinShareScreen,
        Self::LeaveShareScreen,
        Self::Quit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SendMessage => "SEND_MESSAGE",
            Self::ChangeName => "CHANGE_NAME",
            Self::ChangeStatus => "CHANGE_STATUS",
            Self::KickUser => "KICK_USER",
            Self::SendPrivateMessage => "SEND_PRIVATE_MESSAGE",
            Self::StartShareScreen => "START_SHARE_SCREEN",
            Self::EndShareScreen => "END_SHARE_SCREEN",
            Self::JoinShareScreen => "JOIN_SHARE_SCREEN",
            Self::LeaveShareScreen => "LEAVE_SHARE_SCREEN",
            Self::Quit => "QUIT",
        }
    }
}

impl FromStr for Command {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|command| command.as_str() == s)
            .ok_or_else(|| PayloadError::UnknownCommand(s.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-to-client control codes sent with the System type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemCode {
    ConfirmStart,
    DeniedStart,
    ConfirmJoin,
    DeniedJoin,
    Disconnect,
}

impl SystemCode {
    pub const ALL: [SystemCode; 5] = [
        Self::ConfirmStart,
        Self::DeniedStart,
        Self::ConfirmJoin,
        Self::DeniedJoin,
        Self::Disconnect,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfirmStart => "CONFIRM_START",
            Self::DeniedStart => "DENIED_START",
            Self::ConfirmJoin => "CONFIRM_JOIN",
            Self::DeniedJoin => "DENIED_JOIN",
            Self::Disconnect => "DISCONNECT",
        }
    }
}

impl FromStr for SystemCode {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| PayloadError::UnknownSystemCode(s.to_string()))
    }
}

impl fmt::Display for SystemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
