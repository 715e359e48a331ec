//! Per-session bounded outbound queue.
//!
//! Messages are delivered to one recipient strictly in enqueue order. When
//! the queue is full the *new* message is dropped, never an older one, so
//! what does get through keeps its order and a slow consumer can neither
//! grow memory without bound nor stall the reactor.

use std::{collections::VecDeque, io};

use sharecast_shared::protocol::encode;

use super::message::Message;

/// Default number of pending messages per session.
pub const DEFAULT_QUEUE_CAPACITY: usize = 500;

/// Non-blocking byte sink a queue drains into.
///
/// Implemented for the reactor's sockets; `try_write` must never block and
/// reports a full OS buffer as `ErrorKind::WouldBlock`.
#[cfg_attr(test, mockall::automock)]
pub trait FrameSink {
    fn try_write(&self, buf: &[u8]) -> io::Result<usize>;
}

/// Result of one drain attempt that did not hit a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Everything queued has been written.
    Empty,
    /// The sink stopped accepting bytes; the remainder waits for writability.
    WouldBlock,
}

/// Envelope currently being written to the sink.
#[derive(Debug)]
struct InFlight {
    message: Message,
    bytes: Vec<u8>,
    written: usize,
}

impl InFlight {
    fn new(message: Message) -> Self {
        let bytes = encode(&message.render());
        Self {
            message,
            bytes,
            written: 0,
        }
    }

    fn remaining(&self) -> &[u8] {
        &self.bytes[self.written..]
    }

    fn is_complete(&self) -> bool {
        self.written >= self.bytes.len()
    }
}

#[derive(Debug)]
pub struct OutboundQueue {
    pending: VecDeque<Message>,
    /// Head message that was partially written; it always goes out first.
    in_flight: Option<InFlight>,
    capacity: usize,
    dropped: u64,
    sent: u64,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            in_flight: None,
            capacity,
            dropped: 0,
            sent: 0,
        }
    }

    /// Messages waiting, including a partially written head.
    pub fn len(&self) -> usize {
        self.pending.len() + usize::from(self.in_flight.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Messages rejected because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Messages fully written to the sink.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Queue a message; returns `false` (and counts a drop) when full.
    pub fn enqueue(&mut self, message: Message) -> bool {
        if self.len() >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.pending.push_back(message);
        true
    }

    /// Pending messages in delivery order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.in_flight
            .iter()
            .map(|in_flight| &in_flight.message)
            .chain(self.pending.iter())
    }

    /// Discard everything still queued.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.in_flight = None;
    }

    /// Write queued messages into the sink until it would block or the queue
    /// is empty.
    ///
    /// A message that could not be started goes back to the head of the
    /// queue; a partially written one resumes from where it stopped. Any
    /// error other than `WouldBlock`/`Interrupted` is returned for teardown.
    pub fn drain<S>(&mut self, sink: &S) -> io::Result<DrainStatus>
    where
        S: FrameSink + ?Sized,
    {
        loop {
            let mut current = match self.in_flight.take() {
                Some(in_flight) => in_flight,
                None => match self.pending.pop_front() {
                    Some(message) => InFlight::new(message),
                    None => return Ok(DrainStatus::Empty),
                },
            };

            match sink.try_write(current.remaining()) {
                Ok(0) => {
                    self.restore(current);
                    return Err(io::ErrorKind::WriteZero.into());
                }
                Ok(written) => {
                    current.written += written;
                    if current.is_complete() {
                        self.sent += 1;
                    } else {
                        self.in_flight = Some(current);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.restore(current);
                    return Ok(DrainStatus::WouldBlock);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    self.in_flight = Some(current);
                }
                Err(e) => {
                    self.restore(current);
                    return Err(e);
                }
            }
        }
    }

    fn restore(&mut self, current: InFlight) {
        if current.written == 0 {
            self.pending.push_front(current.message);
        } else {
            self.in_flight = Some(current);
        }
    }
}
