//! Screen-share state machine.
//!
//! Each session is either Idle or Sharing, and independently either Idle or
//! Watching exactly one sharer. The coordinator owns both relations, keyed
//! by connection handle; it never owns sessions.
//!
//! Invariants kept by every transition:
//! - a watcher watches at most one sharer
//! - a sharer's watcher set has no duplicates and never contains the sharer
//! - a session is never sharing and watching at the same time

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{error::ShareError, session::ConnectionId};

/// What a departing session leaves behind.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Detached {
    /// Sharer the session was watching.
    pub stopped_watching: Option<ConnectionId>,
    /// Watchers released because the session was sharing.
    pub released_watchers: Vec<ConnectionId>,
}

#[derive(Debug, Default)]
pub struct ScreenShareCoordinator {
    /// Sharer -> its watchers. A key is present exactly while sharing.
    streams: BTreeMap<ConnectionId, BTreeSet<ConnectionId>>,
    /// Watcher -> sharer being watched.
    watching: HashMap<ConnectionId, ConnectionId>,
}

impl ScreenShareCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_sharing(&self, session: ConnectionId) -> bool {
        self.streams.contains_key(&session)
    }

    /// Sharer the session is watching, if any.
    pub fn watching(&self, session: ConnectionId) -> Option<ConnectionId> {
        self.watching.get(&session).copied()
    }

    /// Current watchers of a sharer, in connection order.
    pub fn watchers_of(&self, sharer: ConnectionId) -> Vec<ConnectionId> {
        self.streams
            .get(&sharer)
            .map(|watchers| watchers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Idle -> Sharing.
    pub fn start(&mut self, sharer: ConnectionId) -> Result<(), ShareError> {
        if self.is_sharing(sharer) {
            return Err(ShareError::AlreadySharing);
        }
        if self.watching.contains_key(&sharer) {
            return Err(ShareError::StartWhileWatching);
        }
        self.streams.insert(sharer, BTreeSet::new());
        Ok(())
    }

    /// Sharing -> Idle, releasing every watcher.
    ///
    /// Returns the released watchers in connection order.
    pub fn end(&mut self, sharer: ConnectionId) -> Result<Vec<ConnectionId>, ShareError> {
        let watchers = self
            .streams
            .remove(&sharer)
            .ok_or(ShareError::NotSharing)?;
        for watcher in &watchers {
            self.watching.remove(watcher);
        }
        Ok(watchers.into_iter().collect())
    }

    /// Watcher Idle -> Watching(target). Returns the sharer now being watched.
    ///
    /// `target` is `None` when the requested name resolved to no session;
    /// `target_name` is only used for the rejection message.
    pub fn join(
        &mut self,
        watcher: ConnectionId,
        target: Option<ConnectionId>,
        target_name: &str,
    ) -> Result<ConnectionId, ShareError> {
        let target = target.ok_or_else(|| ShareError::TargetNotFound(target_name.to_string()))?;
        if self.watching.contains_key(&watcher) {
            return Err(ShareError::AlreadyWatching);
        }
        if target == watcher {
            return Err(ShareError::JoinOwnStream);
        }
        if self.is_sharing(watcher) {
            return Err(ShareError::JoinWhileSharing);
        }
        let Some(watchers) = self.streams.get_mut(&target) else {
            return Err(ShareError::TargetNotSharing(target_name.to_string()));
        };
        if !watchers.insert(watcher) {
            return Err(ShareError::AlreadyWatching);
        }
        self.watching.insert(watcher, target);
        Ok(target)
    }

    /// Watching -> Idle. Returns the sharer that was being watched.
    pub fn leave(&mut self, watcher: ConnectionId) -> Result<ConnectionId, ShareError> {
        let sharer = self
            .watching
            .remove(&watcher)
            .ok_or(ShareError::NotWatching)?;
        if let Some(watchers) = self.streams.get_mut(&sharer) {
            watchers.remove(&watcher);
        }
        Ok(sharer)
    }

    /// Drop every relation involving a departing session.
    pub fn detach(&mut self, session: ConnectionId) -> Detached {
        Detached {
            stopped_watching: self.leave(session).ok(),
            released_watchers: self.end(session).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: u64) -> ConnectionId {
        ConnectionId::new(value)
    }

    #[test]
    fn test_start_twice_is_denied_and_stays_sharing() {
        // テスト項目: 共有中に再度 START すると拒否され、共有状態は維持される
        // given (前提条件):
        let mut coordinator = ScreenShareCoordinator::new();
        coordinator.start(id(1)).unwrap();

        // when (操作):
        let result = coordinator.start(id(1));

        // then (期待する結果):
        assert_eq!(result, Err(ShareError::AlreadySharing));
        assert!(coordinator.is_sharing(id(1)));
    }

    #[test]
    fn test_join_non_sharing_target_is_denied() {
        // テスト項目: 共有していない相手への JOIN は拒否される
        // given (前提条件):
        let mut coordinator = ScreenShareCoordinator::new();

        // when (操作):
        let result = coordinator.join(id(2), Some(id(1)), "Alice");

        // then (期待する結果):
        assert_eq!(result, Err(ShareError::TargetNotSharing("Alice".to_string())));
        assert_eq!(coordinator.watching(id(2)), None);
    }

    #[test]
    fn test_join_missing_target_is_denied() {
        // テスト項目: 存在しない相手への JOIN は拒否される
        // given (前提条件):
        let mut coordinator = ScreenShareCoordinator::new();

        // when (操作):
        let result = coordinator.join(id(2), None, "Nobody");

        // then (期待する結果):
        assert_eq!(result, Err(ShareError::TargetNotFound("Nobody".to_string())));
    }

    #[test]
    fn test_join_twice_is_denied() {
        // テスト項目: 既に視聴中のセッションによる JOIN は拒否され、視聴者集合は重複しない
        // given (前提条件):
        let mut coordinator = ScreenShareCoordinator::new();
        coordinator.start(id(1)).unwrap();
        coordinator.join(id(2), Some(id(1)), "Alice").unwrap();

        // when (操作):
        let result = coordinator.join(id(2), Some(id(1)), "Alice");

        // then (期待する結果):
        assert_eq!(result, Err(ShareError::AlreadyWatching));
        assert_eq!(coordinator.watchers_of(id(1)), vec![id(2)]);
    }

    #[test]
    fn test_sharer_cannot_watch_and_watcher_cannot_share() {
        // テスト項目: 共有と視聴は同時に成立しない
        // given (前提条件):
        let mut coordinator = ScreenShareCoordinator::new();
        coordinator.start(id(1)).unwrap();
        coordinator.start(id(3)).unwrap();
        coordinator.join(id(2), Some(id(1)), "Alice").unwrap();

        // when (操作):
        let sharer_joins = coordinator.join(id(3), Some(id(1)), "Alice");
        let self_join = coordinator.join(id(1), Some(id(1)), "Alice");
        let watcher_starts = coordinator.start(id(2));

        // then (期待する結果):
        assert_eq!(sharer_joins, Err(ShareError::JoinWhileSharing));
        assert_eq!(self_join, Err(ShareError::JoinOwnStream));
        assert_eq!(watcher_starts, Err(ShareError::StartWhileWatching));
        assert_eq!(coordinator.watchers_of(id(1)), vec![id(2)]);
    }

    #[test]
    fn test_end_releases_all_watchers() {
        // テスト項目: END で N 人の視聴者が全員 Idle に戻る
        // given (前提条件):
        let mut coordinator = ScreenShareCoordinator::new();
        coordinator.start(id(1)).unwrap();
        for watcher in [4, 2, 3] {
            coordinator.join(id(watcher), Some(id(1)), "Alice").unwrap();
        }

        // when (操作):
        let released = coordinator.end(id(1)).unwrap();

        // then (期待する結果):
        assert_eq!(released, vec![id(2), id(3), id(4)]);
        assert!(!coordinator.is_sharing(id(1)));
        for watcher in [2, 3, 4] {
            assert_eq!(coordinator.watching(id(watcher)), None);
        }
    }

    #[test]
    fn test_leave_returns_sharer() {
        // テスト項目: LEAVE で視聴していた共有者が返され、視聴者集合から外れる
        // given (前提条件):
        let mut coordinator = ScreenShareCoordinator::new();
        coordinator.start(id(1)).unwrap();
        coordinator.join(id(2), Some(id(1)), "Alice").unwrap();

        // when (操作):
        let sharer = coordinator.leave(id(2));
        let again = coordinator.leave(id(2));

        // then (期待する結果):
        assert_eq!(sharer, Ok(id(1)));
        assert_eq!(again, Err(ShareError::NotWatching));
        assert!(coordinator.watchers_of(id(1)).is_empty());
    }

    #[test]
    fn test_detach_clears_both_roles() {
        // テスト項目: 切断時に視聴関係と共有関係の両方が解除される
        // given (前提条件):
        let mut coordinator = ScreenShareCoordinator::new();
        coordinator.start(id(1)).unwrap();
        coordinator.join(id(2), Some(id(1)), "Alice").unwrap();
        coordinator.join(id(3), Some(id(1)), "Alice").unwrap();

        // when (操作):
        let watcher_detached = coordinator.detach(id(2));
        let sharer_detached = coordinator.detach(id(1));

        // then (期待する結果):
        assert_eq!(
            watcher_detached,
            Detached {
                stopped_watching: Some(id(1)),
                released_watchers: vec![],
            }
        );
        assert_eq!(
            sharer_detached,
            Detached {
                stopped_watching: None,
                released_watchers: vec![id(3)],
            }
        );
        assert_eq!(coordinator.watching(id(3)), None);
    }
}
