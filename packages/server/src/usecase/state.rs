//! Relay state owned by the reactor.
//!
//! Bundles the session registry, the screen-share coordinator and the clock.
//! Every mutation happens on the reactor task through `&mut RelayState`, so
//! nothing here needs a lock.

use std::{fmt, io, sync::Arc};

use sharecast_shared::{protocol::SystemCode, time::Clock};

use crate::{
    domain::{ConnectionId, DisplayName, DomainError, Message, ScreenShareCoordinator, Session, SessionId},
    infrastructure::{SessionRegistry, Unregistered},
};

/// Why a session is being torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Zero-length read.
    PeerClosed,
    /// The client sent QUIT.
    Quit,
    /// A moderator kicked the session.
    Kicked { by: String },
    /// Reset, abort, broken pipe or another I/O failure.
    Transport(io::ErrorKind),
    /// The server is shutting down.
    Shutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => f.write_str("peer closed the connection"),
            Self::Quit => f.write_str("quit"),
            Self::Kicked { by } => write!(f, "kicked by {}", by),
            Self::Transport(kind) => write!(f, "transport error ({})", kind),
            Self::Shutdown => f.write_str("server shutdown"),
        }
    }
}

/// A session removed from the registry whose socket still has to be closed.
#[derive(Debug)]
pub struct Departure {
    pub handle: ConnectionId,
    pub session: Session,
    pub reason: CloseReason,
}

pub struct RelayState {
    registry: SessionRegistry,
    screen_share: ScreenShareCoordinator,
    clock: Arc<dyn Clock>,
}

impl RelayState {
    pub fn new(queue_capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: SessionRegistry::new(queue_capacity),
            screen_share: ScreenShareCoordinator::new(),
            clock,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SessionRegistry {
        &mut self.registry
    }

    pub fn screen_share(&self) -> &ScreenShareCoordinator {
        &self.screen_share
    }

    pub(crate) fn screen_share_mut(&mut self) -> &mut ScreenShareCoordinator {
        &mut self.screen_share
    }

    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Display name of a live session.
    pub fn name_of(&self, handle: ConnectionId) -> Option<String> {
        self.registry
            .lookup(handle)
            .map(|session| session.name().to_string())
    }

    pub fn send(&mut self, to: ConnectionId, message: Message) -> bool {
        self.registry.enqueue(to, message)
    }

    pub fn send_notice(&mut self, to: ConnectionId, text: impl Into<String>) -> bool {
        let notice = Message::notice(text, self.now());
        self.registry.enqueue(to, notice)
    }

    pub fn broadcast_notice(&mut self, except: Option<ConnectionId>, text: impl Into<String>) {
        let notice = Message::notice(text, self.now());
        self.registry.broadcast(except, &notice);
    }

    /// Complete the handshake of a new connection.
    ///
    /// Queues the session id reply for the newcomer and a join notice for
    /// everybody else.
    pub fn register(
        &mut self,
        handle: ConnectionId,
        raw_name: &[u8],
    ) -> Result<SessionId, DomainError> {
        let name = DisplayName::try_from(raw_name)?;
        let session = self.registry.register(handle, name);
        let session_id = session.id().clone();
        let name = session.name().to_string();
        let permission = session.permission();

        self.send(handle, Message::Registered(session_id.clone()));
        self.broadcast_notice(Some(handle), format!("{} joined the chat.", name));
        tracing::info!(
            "Session '{}' registered on {} as {} ({})",
            name,
            handle,
            session_id,
            permission
        );

        Ok(session_id)
    }

    /// Force one watcher off its sharer's stream.
    pub(crate) fn release_watcher(
        &mut self,
        sharer: ConnectionId,
        watcher: ConnectionId,
        notify_sharer: bool,
    ) {
        let Some(watcher_name) = self.name_of(watcher) else {
            return;
        };
        let text = format!("{} left stream.", watcher_name);

        self.send(watcher, Message::System(SystemCode::Disconnect));
        self.send_notice(watcher, text.clone());
        if notify_sharer {
            self.send_notice(sharer, text);
        }
    }

    /// Atomically remove a session.
    ///
    /// Detaches it from any stream, removes it from the registry (promoting
    /// a new Owner when needed) and announces the departure. Returns `None`
    /// when the handle has no session.
    pub fn teardown(&mut self, handle: ConnectionId, reason: CloseReason) -> Option<Departure> {
        let name = self.name_of(handle)?;

        let detached = self.screen_share.detach(handle);
        if let Some(sharer) = detached.stopped_watching {
            self.send_notice(sharer, format!("{} left stream.", name));
        }
        for watcher in detached.released_watchers {
            self.release_watcher(handle, watcher, false);
        }

        let Unregistered { session, promoted } = self.registry.unregister(handle)?;
        if let Some(owner_name) = promoted.and_then(|owner| self.name_of(owner)) {
            self.broadcast_notice(None, format!("{} is now the Owner.", owner_name));
        }
        self.broadcast_notice(None, format!("{} left the chat.", name));

        tracing::info!("Session '{}' on {} removed: {}", name, handle, reason);
        Some(Departure {
            handle,
            session,
            reason,
        })
    }
}
