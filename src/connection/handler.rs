// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a client connection.
//!
//! Every frame a client sends is decoded into a raw command vector and run
//! through the shared `Dispatcher` (`crate::core::dispatch`) — the same
//! pipeline `server::core_listener` serves on its own port, here wired in
//! as the primary path for the server's main listener.

use super::guard::ConnectionGuard;
use crate::core::dispatch::{frame_to_command, Connection as DispatchConnection, Dispatcher};
use crate::core::protocol::{RespFrame, RespFrameCodec, RespValue};
use crate::core::state::ServerState;
use crate::core::SpinelDBError;
use crate::server::AnyStream;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

/// How often the main loop drains a connection's pub/sub outbox between
/// frame reads. Mirrors `server::core_listener`'s poll cadence.
const OUTBOX_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Manages the full lifecycle of a client connection.
pub struct ConnectionHandler {
    framed: Framed<AnyStream, RespFrameCodec>,
    addr: SocketAddr,
    state: Arc<ServerState>,
    dispatcher: Arc<Dispatcher>,
    conn: DispatchConnection,
    session_id: u64,
    shutdown_rx: broadcast::Receiver<()>,
    global_shutdown_rx: broadcast::Receiver<()>,
}

impl ConnectionHandler {
    /// Creates a new `ConnectionHandler`.
    pub async fn new(
        socket: AnyStream,
        addr: SocketAddr,
        state: Arc<ServerState>,
        dispatcher: Arc<Dispatcher>,
        session_id: u64,
        shutdown_rx: broadcast::Receiver<()>,
        global_shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        let server_id = state.replication.master_replid.clone();
        Self {
            framed: Framed::new(socket, RespFrameCodec),
            addr,
            state,
            dispatcher,
            conn: DispatchConnection::accept(server_id),
            session_id,
            shutdown_rx,
            global_shutdown_rx,
        }
    }

    /// The main event loop for the connection, handling incoming frames and signals.
    pub async fn run(&mut self) -> Result<(), SpinelDBError> {
        let guard = ConnectionGuard::new(self.state.clone(), self.session_id, self.addr);
        let mut outbox_poll = tokio::time::interval(OUTBOX_POLL_INTERVAL);

        'main_loop: loop {
            tokio::select! {
                // Prioritize shutdown signals over other events.
                biased;
                _ = self.global_shutdown_rx.recv() => {
                    info!("Connection handler for {} received GLOBAL shutdown signal.", self.addr);
                    let shutdown_msg = RespFrame::Error("SHUTDOWN Server is shutting down".to_string());
                    let _ = self.framed.send(shutdown_msg).await;
                    break 'main_loop;
                }
                _ = self.shutdown_rx.recv() => {
                    info!("Connection handler for {} received kill signal.", self.addr);
                    break 'main_loop;
                }
                _ = outbox_poll.tick() => {
                    while let Some(event) = self.conn.outbox.pop() {
                        if self.framed.send(event.into_resp_value().into()).await.is_err() {
                            break 'main_loop;
                        }
                    }
                }
                result = self.framed.next() => {
                    match result {
                        Some(Ok(frame)) => {
                            debug!("Session {}: Received frame: {:?}", self.session_id, frame);
                            match self.process_frame(frame).await {
                                Ok(Some(response)) => {
                                    debug!(
                                        "Session {}: Sending response: {:?}",
                                        self.session_id, response
                                    );
                                    self.framed.send(response.into()).await?;
                                    self.update_client_last_activity().await;
                                }
                                Ok(None) => {
                                    self.update_client_last_activity().await;
                                }
                                Err(e) => {
                                    self.send_error_to_client(e).await?;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            if is_normal_disconnect(&e) {
                                debug!("Connection from {} closed by peer: {}", self.addr, e);
                            } else {
                                warn!("Connection error for {}: {}", self.addr, e);
                            }
                            break 'main_loop;
                        }
                        None => {
                            debug!("Connection from {} closed by peer.", self.addr);
                            break 'main_loop;
                        }
                    }
                }
            }
        }

        drop(guard);
        Ok(())
    }

    /// Decodes a RESP frame into a command vector and runs it through the
    /// shared dispatch pipeline. Returns `None` for commands (e.g.
    /// `(P)SUBSCRIBE`/`(P)UNSUBSCRIBE`) whose reply was already pushed onto
    /// the connection's outbox rather than returned directly — the caller
    /// must not write a frame of its own in that case.
    async fn process_frame(&mut self, frame: RespFrame) -> Result<Option<RespValue>, SpinelDBError> {
        let raw = frame_to_command(frame)?;
        debug!(
            "Session {}: Dispatching command: {}",
            self.session_id,
            String::from_utf8_lossy(raw.first().map(|b| b.as_ref()).unwrap_or(b""))
        );
        Ok(self.dispatcher.dispatch(&self.conn, &raw).await)
    }

    /// Sends an error frame back to the client.
    async fn send_error_to_client(&mut self, e: SpinelDBError) -> Result<(), SpinelDBError> {
        let error_frame = RespFrame::Error(e.client_message());
        debug!(
            "Session {}: Sending error response: {:?}",
            self.session_id, error_frame
        );
        self.framed.send(error_frame).await?;
        Ok(())
    }

    /// Updates the client's last activity time for monitoring (`CLIENT LIST`).
    async fn update_client_last_activity(&self) {
        if let Some(entry) = self.state.clients.get(&self.session_id) {
            entry.value().0.lock().await.last_command_time = Instant::now();
        }
    }
}

/// Helper function to check for non-critical disconnection errors.
fn is_normal_disconnect(e: &SpinelDBError) -> bool {
    matches!(e, SpinelDBError::Io(arc_err) if matches!(
        arc_err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionAborted
    ))
}
