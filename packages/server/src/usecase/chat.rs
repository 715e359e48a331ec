//! UseCase: チャット系コマンド
//!
//! - SEND_MESSAGE: 送信者以外の全員へブロードキャスト
//! - PRIVATE_MESSAGE: `<宛先の表示名>|<本文>` の宛先 1 人にだけ配送
//! - CHANGE_NAME: 表示名を変更して全員へ通知

use crate::domain::{ConnectionId, DisplayName, Message};

use super::{error::DispatchError, state::RelayState};

/// 送信者以外の全員へチャットメッセージを配送
pub fn send_message(
    state: &mut RelayState,
    from: ConnectionId,
    body: &str,
) -> Result<(), DispatchError> {
    let sender = sender_name(state, from)?;
    let message = Message::Chat {
        sender,
        body: body.to_string(),
        timestamp: state.now(),
    };

    let delivered = state.registry_mut().broadcast(Some(from), &message);
    tracing::debug!("Chat message from {} delivered to {} sessions", from, delivered);
    Ok(())
}

/// 表示名で指定した 1 人にだけメッセージを配送
///
/// 同名のセッションが複数いる場合は登録順で最初のセッションに届く。
pub fn send_private_message(
    state: &mut RelayState,
    from: ConnectionId,
    content: &str,
) -> Result<(), DispatchError> {
    let Some((recipient, body)) = content.split_once('|') else {
        return Err(DispatchError::invalid_argument(
            "private message must be '<name>|<message>'",
        ));
    };
    let recipient = recipient.trim();

    let target = state
        .registry()
        .lookup_by_name(recipient)
        .ok_or_else(|| DispatchError::UserNotFound(recipient.to_string()))?;
    let message = Message::Private {
        sender: sender_name(state, from)?,
        recipient: recipient.to_string(),
        body: body.to_string(),
        timestamp: state.now(),
    };

    state.send(target, message);
    Ok(())
}

/// 表示名を変更し、全員（本人を含む）へ通知
pub fn change_name(
    state: &mut RelayState,
    from: ConnectionId,
    content: &str,
) -> Result<(), DispatchError> {
    let new_name =
        DisplayName::new(content).map_err(|e| DispatchError::invalid_argument(e.to_string()))?;
    let Some(session) = state.registry_mut().lookup_mut(from) else {
        return Err(DispatchError::UserNotFound(from.to_string()));
    };

    let old_name = session.rename(new_name.clone());
    tracing::info!("{} renamed '{}' -> '{}'", from, old_name, new_name);
    state.broadcast_notice(None, format!("{} is now known as {}.", old_name, new_name));
    Ok(())
}

pub(crate) fn sender_name(state: &RelayState, from: ConnectionId) -> Result<String, DispatchError> {
    state
        .name_of(from)
        .ok_or_else(|| DispatchError::UserNotFound(from.to_string()))
}
