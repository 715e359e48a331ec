//! Session entity and its value objects.

use std::fmt;

use uuid::Uuid;

use super::{error::DomainError, outbound::OutboundQueue};

/// Opaque handle of one live socket, assigned by the reactor.
///
/// Handles increase monotonically, so ordering by handle is ordering by
/// connection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Stable session identifier handed to the client at registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the raw session id field of a client frame names this session.
    pub fn matches(&self, raw: &[u8]) -> bool {
        self.0.as_bytes() == raw
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User-chosen display name.
///
/// Names are not unique. They must be non-empty after trimming and must not
/// contain the field separator, which would make them unaddressable in
/// `SEND_PRIVATE_MESSAGE <name>|<body>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(name: &str) -> Result<Self, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyDisplayName);
        }
        if trimmed.contains('|') || trimmed.chars().any(char::is_control) {
            return Err(DomainError::InvalidDisplayName(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&[u8]> for DisplayName {
    type Error = DomainError;

    fn try_from(raw: &[u8]) -> Result<Self, Self::Error> {
        let name = std::str::from_utf8(raw).map_err(|_| DomainError::DisplayNameNotUtf8)?;
        Self::new(name)
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Permission level of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionLevel {
    RegularUser,
    Administrator,
    Owner,
}

impl PermissionLevel {
    /// Parse the status digit of `CHANGE_STATUS` (`1` or `2`).
    ///
    /// Owner is never a valid target level.
    pub fn from_status_digit(digit: char) -> Option<Self> {
        match digit {
            '1' => Some(Self::RegularUser),
            '2' => Some(Self::Administrator),
            _ => None,
        }
    }

    /// Whether this level may use moderation commands.
    pub fn can_moderate(self) -> bool {
        matches!(self, Self::Administrator | Self::Owner)
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RegularUser => "RegularUser",
            Self::Administrator => "Administrator",
            Self::Owner => "Owner",
        };
        f.write_str(label)
    }
}

/// One connected user.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    name: DisplayName,
    permission: PermissionLevel,
    outbound: OutboundQueue,
}

impl Session {
    pub fn new(name: DisplayName, permission: PermissionLevel, queue_capacity: usize) -> Self {
        Self {
            id: SessionId::generate(),
            name,
            permission,
            outbound: OutboundQueue::new(queue_capacity),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    /// Replace the display name, returning the previous one.
    pub fn rename(&mut self, name: DisplayName) -> DisplayName {
        std::mem::replace(&mut self.name, name)
    }

    pub fn permission(&self) -> PermissionLevel {
        self.permission
    }

    pub fn set_permission(&mut self, permission: PermissionLevel) {
        self.permission = permission;
    }

    pub fn outbound(&self) -> &OutboundQueue {
        &self.outbound
    }

    pub fn outbound_mut(&mut self) -> &mut OutboundQueue {
        &mut self.outbound
    }
}
