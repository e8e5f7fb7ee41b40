// src/server/core_listener.rs

//! Binds the spec-core dispatch pipeline — the shared `Dispatcher` built by
//! `Dispatcher::standalone` and also used by `connection::ConnectionHandler`
//! — to a second, plain-RESP TCP port. Grounded on
//! `server::connection_loop`'s accept loop for the overall shape (bind,
//! accept, spawn-per-connection, shutdown-aware) and on
//! `core::pubsub::handler::PubSubModeHandler` for the pattern of a
//! `tokio::select!` between reading the socket and draining queued
//! pub/sub deliveries.
//!
//! This exists alongside the primary client port rather than instead of
//! it because the primary port also has to speak TLS and the base's
//! connection-permit/backpressure machinery; this listener is the
//! narrower, always-plain-TCP surface the same dispatcher is reachable
//! through for tooling that doesn't need either.

use crate::core::dispatch::{frame_to_command, Connection, Dispatcher};
use crate::core::protocol::{RespFrameCodec, RespValue};
use anyhow::Result;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

/// How often a connection in the accept loop below checks its own outbox
/// for queued pub/sub deliveries between reads. `Outbox` has no async
/// wakeup of its own (see `core::pubsub::engine`), so this polls it the
/// way `keyspace::ttl::TtlManager` polls for expired keys.
const OUTBOX_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Serves `dispatcher` over `port` until `shutdown_rx` fires. Returns once
/// the listener is closed; errors binding the port are fatal to this task
/// but not to the rest of the server.
pub async fn run(
    port: u16,
    server_id: String,
    dispatcher: Arc<Dispatcher>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("core dispatch listener bound on port {port}");

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                info!("core dispatch listener shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, addr) = accepted?;
                let dispatcher = dispatcher.clone();
                let server_id = server_id.clone();
                let conn_shutdown_rx = shutdown_rx.resubscribe();
                tokio::spawn(async move {
                    debug!("core dispatch connection accepted from {addr}");
                    serve_connection(stream, dispatcher, server_id, conn_shutdown_rx).await;
                    debug!("core dispatch connection from {addr} closed");
                });
            }
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
    server_id: String,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut framed = Framed::new(stream, RespFrameCodec);
    let conn = Connection::accept(server_id);
    let mut outbox_poll = tokio::time::interval(OUTBOX_POLL_INTERVAL);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => return,
            _ = outbox_poll.tick() => {
                while let Some(event) = conn.outbox.pop() {
                    if framed.send(event.into_resp_value().into()).await.is_err() {
                        return;
                    }
                }
            }
            frame = framed.next() => {
                match frame {
                    Some(Ok(frame)) => {
                        let raw = match frame_to_command(frame) {
                            Ok(raw) => raw,
                            Err(e) => {
                                let _ = framed.send(RespValue::Error(e.client_message()).into()).await;
                                continue;
                            }
                        };
                        // `None` means the command (e.g. `(P)SUBSCRIBE`) already
                        // pushed its reply onto the outbox; writing anything
                        // else here would interleave a spurious frame ahead of
                        // those per-channel confirmations.
                        if let Some(response) = dispatcher.dispatch(&conn, &raw).await {
                            if framed.send(response.into()).await.is_err() {
                                return;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!("core dispatch connection frame error: {e}");
                        return;
                    }
                    None => return,
                }
            }
        }
    }
}
