// src/core/replication/coupler.rs

//! Couples the dispatcher to a consensus log for commands that must be
//! replicated before the client sees a response. The consensus library
//! itself is an external collaborator (its leader election, log storage,
//! and apply-callback machinery are out of scope); `ConsensusLog` is the
//! seam a real implementation (e.g. an `openraft`/`raft-rs` wrapper) would
//! fill in. This mirrors the `FSM.Apply` shape of `hashicorp/raft`-family
//! libraries, which is what the system this was distilled from embeds.

use crate::core::errors::SpinelDBError;
use crate::core::protocol::RespValue;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// The replication payload: who originated the command and what it was.
/// JSON-serialized at the boundary so it is portable across the wire
/// format any concrete consensus log uses for its log entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRecord {
    pub origin_server_id: String,
    pub origin_connection_id: u64,
    #[serde(with = "raw_command_as_hex")]
    pub raw_command: Vec<Bytes>,
}

/// `Bytes` isn't valid UTF-8 in general, so the raw command vector is
/// hex-encoded per argument for JSON transport rather than assumed text.
mod raw_command_as_hex {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &[Bytes], ser: S) -> Result<S::Ok, S::Error> {
        let encoded: Vec<String> = value.iter().map(hex::encode).collect();
        encoded.serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<Bytes>, D::Error> {
        let encoded: Vec<String> = Vec::deserialize(de)?;
        encoded
            .into_iter()
            .map(|s| {
                hex::decode(s)
                    .map(Bytes::from)
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

/// What applying a record against local state produced, on the node that
/// ran the apply callback. Exactly one side is populated; the coupler
/// forwards whichever one it is to the client verbatim.
pub enum ApplyOutcome {
    Response(RespValue),
    Error(SpinelDBError),
}

/// The seam a concrete consensus library fills in. `propose` returns only
/// once the record has been applied (on whichever node the library's apply
/// callback runs on) — the await in `ReplicationCoupler::submit` models
/// waiting on that library's "future" type.
#[async_trait]
pub trait ConsensusLog: Send + Sync {
    fn is_leader(&self) -> bool;
    async fn propose(&self, record: ApplyRecord) -> Result<ApplyOutcome, SpinelDBError>;
}

/// How long the coupler waits for a proposal to be applied before giving up
/// and telling the client to retry. Fixed per the distilled design.
pub const PROPOSAL_TIMEOUT: Duration = Duration::from_millis(500);

pub struct ReplicationCoupler {
    server_id: String,
    log: Arc<dyn ConsensusLog>,
}

impl ReplicationCoupler {
    pub fn new(server_id: String, log: Arc<dyn ConsensusLog>) -> Self {
        Self { server_id, log }
    }

    /// Submits an authorized, sync-marked command for replication. Returns
    /// `SpinelDBError::NotLeader` immediately (never proposes) if this node
    /// isn't the consensus leader — forwarding to the leader is explicitly
    /// not implemented, matching the source's own open TODO.
    pub async fn submit(
        &self,
        connection_server_id: &str,
        connection_id: u64,
        raw_command: Vec<Bytes>,
    ) -> Result<RespValue, SpinelDBError> {
        if !self.log.is_leader() {
            return Err(SpinelDBError::NotLeader);
        }

        let record = ApplyRecord {
            origin_server_id: connection_server_id.to_string(),
            origin_connection_id: connection_id,
            raw_command,
        };
        // Marshal failure is only reachable in principle here since hex
        // encoding cannot fail on arbitrary bytes; kept as a distinct error
        // kind because the distilled design calls it out as its own case.
        let applied = tokio::time::timeout(PROPOSAL_TIMEOUT, self.log.propose(record))
            .await
            .map_err(|_| SpinelDBError::ReplicationTimeout(PROPOSAL_TIMEOUT))??;

        match applied {
            ApplyOutcome::Response(v) => Ok(v),
            ApplyOutcome::Error(e) => Err(e),
        }
    }
}
