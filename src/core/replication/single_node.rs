// src/core/replication/single_node.rs

//! A `ConsensusLog` for a single, unclustered node: always the leader, and
//! "proposing" a record means applying it immediately against the local
//! registry/keyspace rather than waiting on any external quorum. This is
//! the honest minimum needed to exercise `ReplicationCoupler` for real —
//! the base has no Raft-family dependency to wrap, and inventing a fake
//! multi-node consensus protocol here would be new surface with no
//! grounding anywhere in the corpus.

use super::append_sink::{AppendSink, NullAppendSink};
use super::coupler::{ApplyOutcome, ApplyRecord, ConsensusLog};
use crate::core::acl::AclContext;
use crate::core::errors::SpinelDBError;
use crate::core::keyspace::Keyspace;
use crate::core::registry::CommandRegistry;
use async_trait::async_trait;
use std::sync::Arc;

pub struct SingleNodeConsensusLog {
    registry: Arc<CommandRegistry>,
    keyspace: Arc<Keyspace>,
    append_sink: Arc<dyn AppendSink>,
}

impl SingleNodeConsensusLog {
    pub fn new(registry: Arc<CommandRegistry>, keyspace: Arc<Keyspace>) -> Self {
        Self::with_append_sink(registry, keyspace, Arc::new(NullAppendSink))
    }

    pub fn with_append_sink(
        registry: Arc<CommandRegistry>,
        keyspace: Arc<Keyspace>,
        append_sink: Arc<dyn AppendSink>,
    ) -> Self {
        Self {
            registry,
            keyspace,
            append_sink,
        }
    }
}

#[async_trait]
impl ConsensusLog for SingleNodeConsensusLog {
    fn is_leader(&self) -> bool {
        true
    }

    /// Looks the command back up in the registry and runs it directly —
    /// there is only one node, so "replicating" a proposal and "applying"
    /// it locally are the same operation.
    async fn propose(&self, record: ApplyRecord) -> Result<ApplyOutcome, SpinelDBError> {
        let Some(name) = record.raw_command.first() else {
            return Ok(ApplyOutcome::Error(SpinelDBError::ProtocolError(
                "empty command".into(),
            )));
        };
        let Ok(name) = std::str::from_utf8(name) else {
            return Ok(ApplyOutcome::Error(SpinelDBError::ProtocolError(
                "command name is not valid UTF-8".into(),
            )));
        };
        let Some(command) = self.registry.lookup(name) else {
            return Ok(ApplyOutcome::Error(SpinelDBError::UnknownCommand(
                name.to_ascii_lowercase(),
            )));
        };
        let acl_ctx = AclContext::new(record.origin_server_id.clone());
        let outcome = match command
            .handle(&self.keyspace, &acl_ctx, &record.raw_command)
            .await
        {
            Ok(v) => ApplyOutcome::Response(v),
            Err(e) => ApplyOutcome::Error(e),
        };
        // Only a successful apply actually changed keyspace state; a failed
        // handler has nothing to persist.
        if matches!(outcome, ApplyOutcome::Response(_)) {
            self.append_sink.append(&record).await;
        }
        Ok(outcome)
    }
}
