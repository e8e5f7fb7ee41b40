// src/core/dispatch/connection.rs

//! The per-session state the dispatcher and pub/sub engine need: an
//! identity that `AUTH` can change, and the subscription bookkeeping used
//! for disconnect cleanup. The production connection (`crate::connection`)
//! carries considerably more (transport handles, transaction state); this
//! is the minimal slice the spec's core actually touches.

use crate::core::pubsub::engine::Outbox;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

pub struct Connection {
    id: u64,
    server_id: String,
    identity: RwLock<String>,
    pub channels: RwLock<HashSet<String>>,
    pub patterns: RwLock<HashSet<String>>,
    pub outbox: Arc<Outbox>,
}

const CONNECTION_OUTBOX_CAPACITY: usize = 1024;

impl Connection {
    /// `numeric_id` is the connection's own sequence number; the full
    /// spec-shaped ID (`serverID-N`) is produced by `full_id`.
    pub fn new(numeric_id: u64, server_id: String) -> Self {
        Self {
            id: numeric_id,
            server_id,
            identity: RwLock::new("default".to_string()),
            channels: RwLock::new(HashSet::new()),
            patterns: RwLock::new(HashSet::new()),
            outbox: Arc::new(Outbox::new(CONNECTION_OUTBOX_CAPACITY)),
        }
    }

    /// Allocates the next connection in process-wide sequence, starting at 1.
    pub fn accept(server_id: String) -> Self {
        Self::new(NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed), server_id)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub fn full_id(&self) -> String {
        format!("{}-{}", self.server_id, self.id)
    }

    pub fn identity(&self) -> String {
        self.identity.read().clone()
    }

    /// Only the connection's own task ever calls this (it is driven by a
    /// successful `AUTH` on that connection's dispatch loop).
    pub fn set_identity(&self, user: impl Into<String>) {
        *self.identity.write() = user.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_identity_is_default_user() {
        let c = Connection::new(1, "srv".into());
        assert_eq!(c.identity(), "default");
    }

    #[test]
    fn accept_assigns_monotonically_increasing_ids() {
        let a = Connection::accept("srv".into());
        let b = Connection::accept("srv".into());
        assert!(b.id() > a.id());
    }

    #[test]
    fn full_id_matches_server_dash_n_shape() {
        let c = Connection::new(7, "srv-42".into());
        assert_eq!(c.full_id(), "srv-42-7");
    }
}
