//! UseCase 層のテスト用ヘルパー

use std::sync::Arc;

use sharecast_shared::{
    protocol::{Command, build_text_frame},
    time::FixedClock,
};

use crate::domain::{ConnectionId, Message, SessionId};

use super::state::RelayState;

/// テストで使う固定時刻（2024-01-01T12:34:00Z）
pub const TS: i64 = 1_704_112_440_000;

pub fn id(value: u64) -> ConnectionId {
    ConnectionId::new(value)
}

pub fn relay_state() -> RelayState {
    RelayState::new(64, Arc::new(FixedClock::new(TS)))
}

pub fn notice(text: &str) -> Message {
    Message::notice(text, TS)
}

/// 登録して、登録時に積まれたメッセージを全員分捨てる
pub fn join(state: &mut RelayState, handle: u64, name: &str) -> SessionId {
    let session_id = state.register(id(handle), name.as_bytes()).unwrap();
    for other in state.registry().handles() {
        take(state, other.value());
    }
    session_id
}

/// 送信キューの中身を取り出す
pub fn take(state: &mut RelayState, handle: u64) -> Vec<Message> {
    let queue = state
        .registry_mut()
        .lookup_mut(id(handle))
        .unwrap()
        .outbound_mut();
    let messages = queue.iter().cloned().collect();
    queue.clear();
    messages
}

pub fn text(session_id: &SessionId, command: Command, content: &str) -> Vec<u8> {
    build_text_frame(session_id.as_str(), command, content)
}
