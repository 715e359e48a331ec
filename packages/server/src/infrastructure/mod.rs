//! Infrastructure layer: the in-memory session registry and the socket
//! implementation of the outbound sink.

pub mod registry;
pub mod socket;

pub use registry::{SessionRegistry, Unregistered};
pub use socket::is_disconnect;
