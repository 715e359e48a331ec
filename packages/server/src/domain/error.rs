//! Domain errors.

use thiserror::Error;

/// Validation errors of domain value objects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("display name must not be empty")]
    EmptyDisplayName,

    #[error("display name {0:?} contains a separator or control character")]
    InvalidDisplayName(String),

    #[error("display name is not valid UTF-8")]
    DisplayNameNotUtf8,
}

/// Rejected transitions of the screen-share state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("you are already sharing your screen")]
    AlreadySharing,

    #[error("stop watching before starting your own stream")]
    StartWhileWatching,

    #[error("you are not sharing your screen")]
    NotSharing,

    #[error("user '{0}' not found")]
    TargetNotFound(String),

    #[error("user '{0}' is not sharing their screen")]
    TargetNotSharing(String),

    #[error("you are already watching a stream")]
    AlreadyWatching,

    #[error("you cannot watch your own stream")]
    JoinOwnStream,

    #[error("stop sharing before joining another stream")]
    JoinWhileSharing,

    #[error("you are not watching a stream")]
    NotWatching,
}
