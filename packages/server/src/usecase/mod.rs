//! UseCase 層
//!
//! リアクタから `&mut RelayState` を受け取り、1 つのペイロードを
//! 状態変更と送信キューへの投入に変換します。

pub mod chat;
pub mod dispatcher;
pub mod error;
pub mod moderation;
pub mod screen_share;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use dispatcher::{Request, dispatch, parse_request, reject_malformed};
pub use error::{DispatchError, ProtocolViolation};
pub use state::{CloseReason, Departure, RelayState};
