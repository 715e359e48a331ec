//! Connection multiplexer.
//!
//! One task owns the listener, every socket and the whole `RelayState`.
//! Each iteration waits for the first of: a new connection, readiness on any
//! socket, the poll interval or shutdown. It then services every connection
//! with non-blocking reads and writes, so the wait is the only suspension
//! point and no lock is ever taken.

use std::{collections::BTreeMap, future::pending, io, net::SocketAddr, pin::Pin, sync::Arc};

use futures_util::future::select_all;
use sharecast_shared::{
    protocol::FrameDecoder,
    time::{Clock, SystemClock},
};
use tokio::{
    io::Interest,
    net::{TcpListener, TcpStream},
};

use crate::{
    config::ServerConfig,
    domain::{ConnectionId, DrainStatus},
    error::ServerError,
    infrastructure::is_disconnect,
    usecase::{CloseReason, Departure, RelayState, dispatch, reject_malformed},
};

use super::{
    connection::{Connection, ReadStatus},
    signal::shutdown_signal,
};

/// Why the reactor woke up.
enum Wake {
    Accepted(io::Result<(TcpStream, SocketAddr)>),
    Ready,
    Tick,
    Shutdown,
}

/// Relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::bind(ServerConfig::default()).await?;
/// server.run().await?;
/// ```
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    state: RelayState,
    connections: BTreeMap<ConnectionId, Connection>,
    next_handle: u64,
}

impl Server {
    /// Validate the configuration and bind the listener.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        Self::bind_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Same as [`Server::bind`] with an injected clock for message timestamps.
    pub async fn bind_with_clock(
        config: ServerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServerError> {
        config.validate()?;

        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            state: RelayState::new(config.queue_capacity, clock),
            config,
            connections: BTreeMap::new(),
            next_handle: 0,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Run until Ctrl+C or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `shutdown` resolves.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!("Relay server listening on {}", self.local_addr()?);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        loop {
            let wake = self.wait(shutdown.as_mut()).await;
            match wake {
                Wake::Shutdown => break,
                Wake::Accepted(Ok((stream, peer))) => self.accept(stream, peer),
                Wake::Accepted(Err(e)) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                }
                Wake::Ready | Wake::Tick => {}
            }
            self.service();
        }

        self.shutdown();
        tracing::info!("Server shutdown complete");
        Ok(())
    }

    async fn wait<F>(&self, shutdown: Pin<&mut F>) -> Wake
    where
        F: Future<Output = ()>,
    {
        let waits: Vec<_> = self
            .connections
            .iter()
            .map(|(handle, connection)| {
                let interest = if self.state.registry().has_pending_output(*handle) {
                    Interest::READABLE | Interest::WRITABLE
                } else {
                    Interest::READABLE
                };
                Box::pin(connection.stream().ready(interest))
            })
            .collect();
        let readiness = async move {
            if waits.is_empty() {
                pending::<()>().await;
            } else {
                let _ = select_all(waits).await;
            }
        };

        tokio::select! {
            _ = shutdown => Wake::Shutdown,
            accepted = self.listener.accept() => Wake::Accepted(accepted),
            _ = readiness => Wake::Ready,
            _ = tokio::time::sleep(self.config.poll_interval) => Wake::Tick,
        }
    }

    fn accept(&mut self, stream: TcpStream, peer: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
        }

        self.next_handle += 1;
        let handle = ConnectionId::new(self.next_handle);
        let decoder =
            FrameDecoder::with_limits(self.config.max_header_len, self.config.max_frame_len);
        self.connections
            .insert(handle, Connection::new(stream, peer, decoder));
        tracing::info!("Accepted {} from {}", handle, peer);
    }

    /// Reads for every connection first, then writes, so replies produced in
    /// this iteration go out in the same iteration.
    fn service(&mut self) {
        let handles: Vec<ConnectionId> = self.connections.keys().copied().collect();
        for handle in &handles {
            self.service_reads(*handle);
        }

        let handles: Vec<ConnectionId> = self.connections.keys().copied().collect();
        for handle in handles {
            self.service_writes(handle);
        }
    }

    fn service_reads(&mut self, handle: ConnectionId) {
        let Some(connection) = self.connections.get_mut(&handle) else {
            return;
        };
        let status = connection.fill(self.config.read_budget);

        loop {
            // A frame may have closed this connection (QUIT, handshake failure).
            let Some(connection) = self.connections.get_mut(&handle) else {
                return;
            };
            let frame = match connection.decoder_mut().decode_next() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    if self.state.registry().contains(handle) {
                        reject_malformed(&mut self.state, handle, e);
                    } else {
                        tracing::warn!("Malformed handshake from {}: {}", handle, e);
                        self.drop_connection(handle, "malformed handshake");
                        return;
                    }
                    continue;
                }
            };

            if self.state.registry().contains(handle) {
                tracing::debug!("{} sent a {} byte payload", handle, frame.len());
                for departure in dispatch(&mut self.state, handle, &frame) {
                    self.finish_departure(departure);
                }
            } else if let Err(e) = self.state.register(handle, &frame) {
                tracing::warn!("Rejected handshake from {}: {}", handle, e);
                self.drop_connection(handle, "invalid display name");
                return;
            }
        }

        match status {
            Ok(ReadStatus::Open) => {}
            Ok(ReadStatus::Closed) => self.close(handle, CloseReason::PeerClosed),
            Err(e) => {
                log_transport_error(handle, &e);
                self.close(handle, CloseReason::Transport(e.kind()));
            }
        }
    }

    fn service_writes(&mut self, handle: ConnectionId) {
        let Some(connection) = self.connections.get(&handle) else {
            return;
        };
        let Some(session) = self.state.registry_mut().lookup_mut(handle) else {
            return;
        };
        if session.outbound().is_empty() {
            return;
        }

        let result = session.outbound_mut().drain(connection.stream());
        match result {
            Ok(DrainStatus::Empty) => {}
            Ok(DrainStatus::WouldBlock) => {
                tracing::debug!("Socket of {} is full, resuming on writability", handle);
            }
            Err(e) => {
                log_transport_error(handle, &e);
                self.close(handle, CloseReason::Transport(e.kind()));
            }
        }
    }

    /// Tear down the session on `handle` (if any) and close its socket.
    fn close(&mut self, handle: ConnectionId, reason: CloseReason) {
        match self.state.teardown(handle, reason) {
            Some(departure) => self.finish_departure(departure),
            None => self.drop_connection(handle, "closed before registration"),
        }
    }

    /// Flush what the departed session can still take, then close the socket.
    fn finish_departure(&mut self, departure: Departure) {
        let Departure {
            handle,
            mut session,
            reason,
        } = departure;
        let Some(connection) = self.connections.remove(&handle) else {
            return;
        };

        match session.outbound_mut().drain(connection.stream()) {
            Ok(DrainStatus::Empty) => {}
            Ok(DrainStatus::WouldBlock) => tracing::debug!(
                "{} closed with {} messages unsent",
                handle,
                session.outbound().len()
            ),
            Err(e) => tracing::debug!("Final flush to {} failed: {}", handle, e),
        }
        tracing::info!(
            "Closed {} ({}, '{}'): {}",
            handle,
            connection.peer(),
            session.name(),
            reason
        );
    }

    fn drop_connection(&mut self, handle: ConnectionId, why: &str) {
        if let Some(connection) = self.connections.remove(&handle) {
            tracing::info!("Closed {} ({}): {}", handle, connection.peer(), why);
        }
    }

    /// Give every session one last non-blocking flush and close all sockets.
    fn shutdown(&mut self) {
        let connections = std::mem::take(&mut self.connections);
        tracing::info!("Closing {} connections", connections.len());

        for (handle, connection) in connections {
            if let Some(session) = self.state.registry_mut().lookup_mut(handle) {
                if let Err(e) = session.outbound_mut().drain(connection.stream()) {
                    tracing::debug!("Final flush to {} failed: {}", handle, e);
                }
            }
            self.state.registry_mut().unregister(handle);
        }
    }
}

fn log_transport_error(handle: ConnectionId, error: &io::Error) {
    if is_disconnect(error) {
        tracing::debug!("{} disconnected: {}", handle, error);
    } else {
        tracing::warn!("Transport error on {}: {}", handle, error);
    }
}
