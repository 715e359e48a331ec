//! Per-connection transport state owned by the reactor.

use std::{io, net::SocketAddr};

use sharecast_shared::protocol::FrameDecoder;
use tokio::net::TcpStream;

/// Scratch size of one `try_read` call.
const READ_CHUNK: usize = 16 * 1024;

/// Outcome of reading whatever a socket has available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// The socket is still open; more bytes may arrive later.
    Open,
    /// The peer closed its side (zero-length read).
    Closed,
}

/// A live socket plus the receive buffer of its partially read frames.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    decoder: FrameDecoder,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, decoder: FrameDecoder) -> Self {
        Self {
            stream,
            peer,
            decoder,
        }
    }

    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn decoder_mut(&mut self) -> &mut FrameDecoder {
        &mut self.decoder
    }

    /// Read without blocking until the socket would block or `budget` bytes
    /// have been buffered.
    ///
    /// Bytes read before a close are kept in the decoder so their frames can
    /// still be dispatched.
    pub fn fill(&mut self, budget: usize) -> io::Result<ReadStatus> {
        let mut scratch = [0u8; READ_CHUNK];
        let mut total = 0;

        while total < budget {
            match self.stream.try_read(&mut scratch) {
                Ok(0) => return Ok(ReadStatus::Closed),
                Ok(n) => {
                    self.decoder.feed(&scratch[..n]);
                    total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(ReadStatus::Open)
    }
}
