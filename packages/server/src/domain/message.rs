//! Outbound messages and their wire rendering.

use std::sync::Arc;

use sharecast_shared::{
    protocol::{MessageType, SystemCode, build_server_payload},
    time::format_local_clock_time,
};

use super::session::SessionId;

/// A message queued for one recipient.
///
/// Immutable once built; rendered into a payload only when it reaches the
/// head of the recipient's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Handshake reply carrying the assigned session id (raw payload, no type tag).
    Registered(SessionId),
    /// Public chat line.
    Chat {
        sender: String,
        body: String,
        timestamp: i64,
    },
    /// Direct message to one recipient.
    Private {
        sender: String,
        recipient: String,
        body: String,
        timestamp: i64,
    },
    /// Server-originated text: join/leave notices, status changes, error replies.
    Notice { text: String, timestamp: i64 },
    /// Control code for the client state machine.
    System(SystemCode),
    /// Opaque video frame, shared between all watchers it fans out to.
    Frame(Arc<[u8]>),
}

impl Message {
    pub fn notice(text: impl Into<String>, timestamp: i64) -> Self {
        Self::Notice {
            text: text.into(),
            timestamp,
        }
    }

    /// Type tag this message travels under, if any.
    pub fn message_type(&self) -> Option<MessageType> {
        match self {
            Self::Registered(_) => None,
            Self::Chat { .. } | Self::Private { .. } | Self::Notice { .. } => {
                Some(MessageType::Text)
            }
            Self::System(_) => Some(MessageType::System),
            Self::Frame(_) => Some(MessageType::Binary),
        }
    }

    /// Render the decoded payload (before envelope encoding).
    pub fn render(&self) -> Vec<u8> {
        match self {
            Self::Registered(session_id) => session_id.as_str().as_bytes().to_vec(),
            Self::Chat {
                sender,
                body,
                timestamp,
            } => text_payload(format!(
                "{} {} : {}",
                format_local_clock_time(*timestamp),
                sender,
                body
            )),
            Self::Private {
                sender,
                body,
                timestamp,
                ..
            } => text_payload(format!(
                "{} Private Message From {} : {}",
                format_local_clock_time(*timestamp),
                sender,
                body
            )),
            Self::Notice { text, timestamp } => {
                text_payload(format!("{} {}", format_local_clock_time(*timestamp), text))
            }
            Self::System(code) => build_server_payload(MessageType::System, code.as_str().as_bytes()),
            Self::Frame(bytes) => build_server_payload(MessageType::Binary, bytes),
        }
    }
}

fn text_payload(text: String) -> Vec<u8> {
    build_server_payload(MessageType::Text, text.as_bytes())
}
