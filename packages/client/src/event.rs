//! Events received from the server.

use sharecast_shared::protocol::{MessageType, PayloadError, SystemCode, split_server_payload};

/// One decoded server-to-client payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Chat, private message or server notice, already formatted for display.
    Text(String),
    /// Screen-share frame bytes.
    Frame(Vec<u8>),
    /// Control code.
    System(SystemCode),
    /// The server closed the connection.
    Closed,
}

impl ServerEvent {
    pub fn from_payload(payload: &[u8]) -> Result<Self, PayloadError> {
        let (message_type, content) = split_server_payload(payload)?;
        match message_type {
            MessageType::Text => Ok(Self::Text(String::from_utf8_lossy(content).into_owned())),
            MessageType::Binary => Ok(Self::Frame(content.to_vec())),
            MessageType::System => {
                let code = std::str::from_utf8(content)
                    .map_err(|_| PayloadError::InvalidUtf8("system code"))?;
                Ok(Self::System(code.parse()?))
            }
        }
    }
}
