//! UseCase: 画面共有コマンドとフレーム中継
//!
//! 状態遷移そのものは `ScreenShareCoordinator` が判定し、ここでは
//! 遷移の結果を CONFIRM_* / DENIED_* / DISCONNECT と通知テキストに変換します。

use std::sync::Arc;

use sharecast_shared::protocol::SystemCode;

use crate::domain::{ConnectionId, Message};

use super::{chat::sender_name, error::DispatchError, state::RelayState};

/// START_SHARE_SCREEN
pub fn start_stream(state: &mut RelayState, from: ConnectionId) -> Result<(), DispatchError> {
    if let Err(e) = state.screen_share_mut().start(from) {
        state.send(from, Message::System(SystemCode::DeniedStart));
        return Err(e.into());
    }

    let name = sender_name(state, from)?;
    state.send(from, Message::System(SystemCode::ConfirmStart));
    state.broadcast_notice(Some(from), format!("{} started sharing screen.", name));
    tracing::info!("'{}' ({}) started sharing", name, from);
    Ok(())
}

/// END_SHARE_SCREEN: 全ての視聴者に終了を伝えてから切り離す
pub fn end_stream(state: &mut RelayState, from: ConnectionId) -> Result<(), DispatchError> {
    let released = state.screen_share_mut().end(from)?;
    let name = sender_name(state, from)?;
    let ended = format!("{} ended stream.", name);

    for watcher in &released {
        state.send_notice(*watcher, ended.clone());
        state.release_watcher(from, *watcher, true);
    }
    state.send_notice(from, ended);
    tracing::info!(
        "'{}' ({}) ended sharing, released {} watchers",
        name,
        from,
        released.len()
    );
    Ok(())
}

/// JOIN_SHARE_SCREEN <共有者の表示名>
pub fn join_stream(
    state: &mut RelayState,
    from: ConnectionId,
    content: &str,
) -> Result<(), DispatchError> {
    let target_name = content.trim();
    let target = state.registry().lookup_by_name(target_name);

    let sharer = match state.screen_share_mut().join(from, target, target_name) {
        Ok(sharer) => sharer,
        Err(e) => {
            state.send(from, Message::System(SystemCode::DeniedJoin));
            return Err(e.into());
        }
    };

    let text = format!("{} joined stream.", sender_name(state, from)?);
    state.send(from, Message::System(SystemCode::ConfirmJoin));
    state.send_notice(from, text.clone());
    state.send_notice(sharer, text);
    Ok(())
}

/// LEAVE_SHARE_SCREEN
pub fn leave_stream(state: &mut RelayState, from: ConnectionId) -> Result<(), DispatchError> {
    let sharer = state.screen_share_mut().leave(from)?;
    state.release_watcher(sharer, from, true);
    Ok(())
}

/// 共有者から届いたバイナリフレームを現在の視聴者全員へ中継
///
/// 共有していないセッションからのフレームは破棄する。
pub fn relay_frame(state: &mut RelayState, from: ConnectionId, frame: &[u8]) {
    if !state.screen_share().is_sharing(from) {
        tracing::debug!("Dropping {} byte frame from non-sharing {}", frame.len(), from);
        return;
    }

    let frame: Arc<[u8]> = Arc::from(frame);
    for watcher in state.screen_share().watchers_of(from) {
        state.send(watcher, Message::Frame(Arc::clone(&frame)));
    }
}
