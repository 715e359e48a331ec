//! UseCase 層のエラー定義
//!
//! どのエラーも送信者への返信（`Error: ...` の通知）で完結し、
//! 送信者の接続は維持されます。

use sharecast_shared::protocol::{FrameFormatError, PayloadError};
use thiserror::Error;

use crate::domain::ShareError;

/// プロトコル違反（未知の型タグ・未知のコマンド・セッション ID 不一致など）
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("session id does not match this connection")]
    SessionMismatch,

    #[error("system messages cannot be sent by clients")]
    SystemFromClient,

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("{0}")]
    InvalidArgument(String),
}

/// コマンド処理のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("malformed frame: {0}")]
    FrameFormat(#[from] FrameFormatError),

    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("user '{0}' not found")]
    UserNotFound(String),

    #[error(transparent)]
    State(#[from] ShareError),
}

impl From<PayloadError> for DispatchError {
    fn from(error: PayloadError) -> Self {
        Self::Protocol(ProtocolViolation::Payload(error))
    }
}

impl DispatchError {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::Protocol(ProtocolViolation::InvalidArgument(reason.into()))
    }

    /// ログ用のエラー分類
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FrameFormat(_) => "frame-format",
            Self::Protocol(_) => "protocol-violation",
            Self::PermissionDenied(_) => "permission-denied",
            Self::UserNotFound(_) | Self::State(_) => "state-violation",
        }
    }
}
