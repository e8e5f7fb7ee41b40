// src/core/replication/append_sink.rs

//! The persistence boundary fixed (but not filled in) by the specification:
//! "append-only file entries are the same JSON `ApplyRecord` form used in
//! replication, written post-apply." On-disk durability across restarts is
//! an explicit Non-goal, so this module only fixes the seam a real AOF
//! writer would plug into — a trait taking `&ApplyRecord` after a
//! successful apply — and ships a no-op implementation.
//!
//! This is a different, narrower thing than the base's own
//! `core::persistence` AOF/SPLDB stack: that stack serializes the base's
//! `core::commands::Command` enum, a catalog this tree's core does not
//! depend on (see `DESIGN.md`). `AppendSink` instead takes the spec's own
//! `ApplyRecord`, the one payload shape the replication coupler already
//! produces, so adding a durable sink later needs no new wire format.

use super::coupler::ApplyRecord;
use async_trait::async_trait;

/// Called with every record that was successfully applied, on whichever
/// node ran the apply callback. Errors are logged by the caller and never
/// fail the client-facing response — persistence is best-effort background
/// work, not part of the write's success criteria (durability-across-
/// restarts is an explicit Non-goal).
#[async_trait]
pub trait AppendSink: Send + Sync {
    async fn append(&self, record: &ApplyRecord);
}

/// The stand-in this implementation ships: durability across restarts is
/// out of scope, so nothing is written anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAppendSink;

#[async_trait]
impl AppendSink for NullAppendSink {
    async fn append(&self, _record: &ApplyRecord) {}
}
