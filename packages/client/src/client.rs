//! Connection to a relay server.
//!
//! [`RelayClient::connect`] performs the handshake (display name out,
//! session id back). Afterwards the client can be split into an
//! [`EventReceiver`] and a [`CommandSender`] so that reading and writing can
//! happen from different branches of a `select!`.

use sharecast_shared::protocol::{Command, FrameDecoder, build_binary_frame, build_text_frame, encode};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpStream, ToSocketAddrs,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

use crate::{error::ClientError, event::ServerEvent};

const READ_CHUNK: usize = 16 * 1024;

/// Read half: decodes envelopes into [`ServerEvent`]s.
#[derive(Debug)]
pub struct EventReceiver {
    read: OwnedReadHalf,
    decoder: FrameDecoder,
}

impl EventReceiver {
    /// Next decoded payload, or `None` once the server closed the socket.
    async fn next_payload(&mut self) -> Result<Option<Vec<u8>>, ClientError> {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            if let Some(payload) = self.decoder.decode_next()? {
                return Ok(Some(payload));
            }
            let n = self.read.read(&mut buf).await?;
            if n == 0 {
                return Ok(None);
            }
            self.decoder.feed(&buf[..n]);
        }
    }

    /// Wait for the next server event.
    ///
    /// Cancel safe: bytes are only consumed once a read completes.
    pub async fn recv(&mut self) -> Result<ServerEvent, ClientError> {
        match self.next_payload().await? {
            Some(payload) => Ok(ServerEvent::from_payload(&payload)?),
            None => Ok(ServerEvent::Closed),
        }
    }
}

/// Write half: frames commands with the session id.
#[derive(Debug)]
pub struct CommandSender {
    write: OwnedWriteHalf,
    session_id: String,
}

impl CommandSender {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn send_command(
        &mut self,
        command: Command,
        content: &str,
    ) -> Result<(), ClientError> {
        let payload = build_text_frame(&self.session_id, command, content);
        self.send_payload(&payload).await
    }

    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<(), ClientError> {
        let payload = build_binary_frame(&self.session_id, frame);
        self.send_payload(&payload).await
    }

    /// Send an arbitrary payload, wrapped in an envelope.
    pub async fn send_payload(&mut self, payload: &[u8]) -> Result<(), ClientError> {
        self.write.write_all(&encode(payload)).await?;
        Ok(())
    }
}

/// A registered connection to the relay server.
#[derive(Debug)]
pub struct RelayClient {
    events: EventReceiver,
    sender: CommandSender,
    display_name: String,
}

impl RelayClient {
    /// Connect and register under `display_name`.
    pub async fn connect<A>(addr: A, display_name: &str) -> Result<Self, ClientError>
    where
        A: ToSocketAddrs,
    {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (read, mut write) = stream.into_split();

        write.write_all(&encode(display_name.as_bytes())).await?;

        let mut events = EventReceiver {
            read,
            decoder: FrameDecoder::new(),
        };
        let Some(reply) = events.next_payload().await? else {
            return Err(ClientError::Handshake(format!(
                "server rejected display name '{}'",
                display_name
            )));
        };
        let session_id = String::from_utf8(reply)
            .map_err(|_| ClientError::Handshake("session id is not valid UTF-8".to_string()))?;
        tracing::info!("Registered as '{}' ({})", display_name, session_id);

        Ok(Self {
            events,
            sender: CommandSender { write, session_id },
            display_name: display_name.to_string(),
        })
    }

    pub fn session_id(&self) -> &str {
        self.sender.session_id()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub async fn send_command(
        &mut self,
        command: Command,
        content: &str,
    ) -> Result<(), ClientError> {
        self.sender.send_command(command, content).await
    }

    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<(), ClientError> {
        self.sender.send_frame(frame).await
    }

    pub async fn send_payload(&mut self, payload: &[u8]) -> Result<(), ClientError> {
        self.sender.send_payload(payload).await
    }

    pub async fn recv(&mut self) -> Result<ServerEvent, ClientError> {
        self.events.recv().await
    }

    pub fn into_split(self) -> (EventReceiver, CommandSender) {
        (self.events, self.sender)
    }
}
