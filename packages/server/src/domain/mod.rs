//! Domain layer: sessions, messages, the outbound queue and the screen-share
//! state machine. Nothing here performs I/O.

pub mod error;
pub mod message;
pub mod outbound;
pub mod screen_share;
pub mod session;

pub use error::{DomainError, ShareError};
pub use message::Message;
pub use outbound::{DEFAULT_QUEUE_CAPACITY, DrainStatus, FrameSink, OutboundQueue};
pub use screen_share::{Detached, ScreenShareCoordinator};
pub use session::{ConnectionId, DisplayName, PermissionLevel, Session, SessionId};
