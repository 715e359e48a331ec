//! インメモリ Session Registry 実装
//!
//! 接続ハンドルからセッションへの対応を保持します。リアクタのスレッドだけが
//! 所有・更新するため、ロックは使いません。
//!
//! ## 設計ノート
//!
//! - `BTreeMap` のキーは単調増加する `ConnectionId` なので、反復順は登録順
//! - 表示名は一意ではなく、名前での検索は登録順で最初に一致したものを返す
//! - Owner はちょうど 1 人。Owner が抜けた場合は最も古いセッションを昇格する

use std::collections::{BTreeMap, btree_map::Entry};

use crate::domain::{ConnectionId, DisplayName, Message, PermissionLevel, Session};

/// 登録解除の結果
#[derive(Debug)]
pub struct Unregistered {
    /// 削除されたセッション
    pub session: Session,
    /// Owner の離脱に伴って昇格したセッション
    pub promoted: Option<ConnectionId>,
}

/// 接続中セッションの唯一の所有者
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: BTreeMap<ConnectionId, Session>,
    /// 各セッションの送信キュー容量
    queue_capacity: usize,
}

impl SessionRegistry {
    /// 新しい SessionRegistry を作成
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            sessions: BTreeMap::new(),
            queue_capacity,
        }
    }

    /// セッションを登録
    ///
    /// 接続中のセッションがいなければ Owner、それ以外は RegularUser になる。
    pub fn register(&mut self, handle: ConnectionId, name: DisplayName) -> &mut Session {
        let permission = if self.sessions.is_empty() {
            PermissionLevel::Owner
        } else {
            PermissionLevel::RegularUser
        };
        let session = Session::new(name, permission, self.queue_capacity);
        tracing::debug!(
            "Registered {} as '{}' ({})",
            handle,
            session.name(),
            session.permission()
        );
        match self.sessions.entry(handle) {
            Entry::Vacant(vacant) => vacant.insert(session),
            Entry::Occupied(mut occupied) => {
                tracing::warn!("Handle {} was already registered, replacing session", handle);
                occupied.insert(session);
                occupied.into_mut()
            }
        }
    }

    pub fn lookup(&self, handle: ConnectionId) -> Option<&Session> {
        self.sessions.get(&handle)
    }

    pub fn lookup_mut(&mut self, handle: ConnectionId) -> Option<&mut Session> {
        self.sessions.get_mut(&handle)
    }

    /// 表示名で検索（登録順で最初に一致したセッション）
    pub fn lookup_by_name(&self, name: &str) -> Option<ConnectionId> {
        self.sessions
            .iter()
            .find(|(_, session)| session.name().as_str() == name)
            .map(|(handle, _)| *handle)
    }

    pub fn contains(&self, handle: ConnectionId) -> bool {
        self.sessions.contains_key(&handle)
    }

    /// セッションを削除
    ///
    /// 削除したのが Owner で他のセッションが残っている場合、最も古いセッションを
    /// 同期的に Owner へ昇格させる。
    pub fn unregister(&mut self, handle: ConnectionId) -> Option<Unregistered> {
        let session = self.sessions.remove(&handle)?;

        let promoted = if session.permission() == PermissionLevel::Owner {
            self.sessions.iter_mut().next().map(|(next, successor)| {
                successor.set_permission(PermissionLevel::Owner);
                tracing::info!("Promoted {} ('{}') to Owner", next, successor.name());
                *next
            })
        } else {
            None
        };

        Some(Unregistered { session, promoted })
    }

    /// 現在の Owner
    pub fn owner(&self) -> Option<ConnectionId> {
        self.sessions
            .iter()
            .find(|(_, session)| session.permission() == PermissionLevel::Owner)
            .map(|(handle, _)| *handle)
    }

    /// 接続中の全てのハンドル（登録順）
    pub fn handles(&self) -> Vec<ConnectionId> {
        self.sessions.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// 送信待ちのメッセージがあるか
    pub fn has_pending_output(&self, handle: ConnectionId) -> bool {
        self.sessions
            .get(&handle)
            .is_some_and(|session| !session.outbound().is_empty())
    }

    /// 1 つのセッションの送信キューにメッセージを追加
    ///
    /// キューが満杯の場合は新しいメッセージを破棄して `false` を返す。
    pub fn enqueue(&mut self, handle: ConnectionId, message: Message) -> bool {
        let Some(session) = self.sessions.get_mut(&handle) else {
            tracing::warn!("Session {} not found, dropping outbound message", handle);
            return false;
        };

        let accepted = session.outbound_mut().enqueue(message);
        if !accepted {
            tracing::warn!(
                "Outbound queue of {} ('{}') is full, dropped message (total dropped: {})",
                handle,
                session.name(),
                session.outbound().dropped()
            );
        }
        accepted
    }

    /// 全セッション（`except` を除く）にブロードキャスト
    ///
    /// 受け付けられた件数を返す。一部のキューが満杯でも他には配送される。
    pub fn broadcast(&mut self, except: Option<ConnectionId>, message: &Message) -> usize {
        let targets: Vec<ConnectionId> = self
            .sessions
            .keys()
            .copied()
            .filter(|handle| Some(*handle) != except)
            .collect();

        targets
            .into_iter()
            .filter(|handle| self.enqueue(*handle, message.clone()))
            .count()
    }
}
