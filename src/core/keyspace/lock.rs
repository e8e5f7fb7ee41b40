// src/core/keyspace/lock.rs

//! Per-key reader/writer locking with cancellation-aware acquisition.
//!
//! The distilled design called for a 5ms poll-ticker while waiting for a
//! contended key lock, a workaround for a non-cancellable mutex primitive in
//! the system it was distilled from. Tokio's `RwLock` already queues and
//! cleanly drops cancelled waiters, so acquisition here races the lock
//! future against a deadline with `tokio::select!` instead of polling.

use super::value::Entry;
use crate::core::SpinelDBError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tokio_util::sync::CancellationToken;

/// Per-acquisition cancellation context: a deadline and an optional external
/// cancellation token (e.g. tied to connection shutdown).
#[derive(Clone)]
pub struct LockContext {
    pub deadline: Duration,
    pub cancel: CancellationToken,
}

impl LockContext {
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline,
            cancel: CancellationToken::new(),
        }
    }
}

impl Default for LockContext {
    fn default() -> Self {
        Self::with_deadline(Duration::from_secs(5))
    }
}

type KeyCell = Arc<RwLock<Entry>>;

/// A held write lock on a single key. Mutation only happens through this
/// guard; there is no separate `Keyspace::set` that could be called without
/// holding the lock first. Dropping the guard releases the lock.
pub struct KeyWriteGuard {
    key: Arc<[u8]>,
    inner: OwnedRwLockWriteGuard<Entry>,
}

impl KeyWriteGuard {
    pub fn get(&self) -> &Entry {
        &self.inner
    }

    pub fn set(&mut self, entry: Entry) {
        *self.inner = entry;
    }

    pub fn entry_mut(&mut self) -> &mut Entry {
        &mut self.inner
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Explicit release, for symmetry with the distilled `unlock(key)` API.
    /// Equivalent to dropping the guard.
    pub fn unlock(self) {
        drop(self);
    }
}

/// A held read lock on a single key.
pub struct KeyReadGuard {
    key: Arc<[u8]>,
    inner: OwnedRwLockReadGuard<Entry>,
}

impl KeyReadGuard {
    pub fn get(&self) -> &Entry {
        &self.inner
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn runlock(self) {
        drop(self);
    }
}

/// Maps keys to their per-key lock. Insertion into this table is serialized
/// by a single creation gate (`parking_lot::Mutex`, held only for the
/// duration of the table mutation, never across a caller's critical
/// section).
pub struct Keyspace {
    table: dashmap::DashMap<Arc<[u8]>, KeyCell>,
    creation_gate: parking_lot::Mutex<()>,
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyspace {
    pub fn new() -> Self {
        Self {
            table: dashmap::DashMap::new(),
            creation_gate: parking_lot::Mutex::new(()),
        }
    }

    pub fn exists(&self, key: &[u8]) -> bool {
        self.table.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Acquires the writer lock for `key`, creating it (empty) first if
    /// absent. Aborts with `SpinelDBError::LockTimeout` if the context's
    /// deadline elapses or its cancellation token fires before the lock is
    /// granted.
    ///
    /// A newly created cell is write-locked *before* it is ever inserted
    /// into `self.table`: the lock is taken on the lone `Arc` still held
    /// only by this call, under the creation gate, so no concurrent
    /// `lock()`/`rlock()` can observe the cell, let alone win a race to
    /// acquire it, until this call already holds the write guard.
    pub async fn create_and_lock(
        &self,
        ctx: &LockContext,
        key: &[u8],
        default: impl FnOnce() -> Entry,
    ) -> Result<KeyWriteGuard, SpinelDBError> {
        enum Resolved {
            New(OwnedRwLockWriteGuard<Entry>),
            Existing(KeyCell),
        }

        let resolved = if let Some(cell) = self.table.get(key) {
            Resolved::Existing(cell.value().clone())
        } else {
            let _gate = self.creation_gate.lock();
            // Re-check: another task may have created it while we waited for the gate.
            if let Some(cell) = self.table.get(key) {
                Resolved::Existing(cell.value().clone())
            } else {
                let cell: KeyCell = Arc::new(RwLock::new(default()));
                let guard = cell
                    .clone()
                    .try_write_owned()
                    .expect("freshly created lock cannot be contended");
                self.table.insert(Arc::from(key), cell);
                Resolved::New(guard)
            }
        };

        match resolved {
            Resolved::New(guard) => Ok(KeyWriteGuard {
                key: Arc::from(key),
                inner: guard,
            }),
            Resolved::Existing(cell) => self.await_write(ctx, key, cell).await,
        }
    }

    /// Acquires the writer lock for an existing key. Fails with
    /// `SpinelDBError::LockTimeout`-shaped behavior is not used for "absent" —
    /// callers check `exists` or use `create_and_lock` for that; this is for
    /// commands that require the key already exist (callers translate a
    /// `None` into their own `KeyNotFound`-style response).
    pub async fn lock(
        &self,
        ctx: &LockContext,
        key: &[u8],
    ) -> Result<Option<KeyWriteGuard>, SpinelDBError> {
        let Some(cell) = self.table.get(key).map(|c| c.value().clone()) else {
            return Ok(None);
        };
        self.await_write(ctx, key, cell).await.map(Some)
    }

    pub async fn rlock(
        &self,
        ctx: &LockContext,
        key: &[u8],
    ) -> Result<Option<KeyReadGuard>, SpinelDBError> {
        let Some(cell) = self.table.get(key).map(|c| c.value().clone()) else {
            return Ok(None);
        };
        self.await_read(ctx, key, cell).await.map(Some)
    }

    /// Removes a key entirely. The lock cell is dropped from the table;
    /// any guard already held against the old cell remains valid for its
    /// own lifetime but the key becomes immediately re-creatable as new.
    pub fn remove(&self, key: &[u8]) -> bool {
        self.table.remove(key).is_some()
    }

    async fn await_write(
        &self,
        ctx: &LockContext,
        key: &[u8],
        cell: KeyCell,
    ) -> Result<KeyWriteGuard, SpinelDBError> {
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(SpinelDBError::LockTimeout(String::from_utf8_lossy(key).into_owned())),
            () = tokio::time::sleep(ctx.deadline) => Err(SpinelDBError::LockTimeout(String::from_utf8_lossy(key).into_owned())),
            guard = cell.clone().write_owned() => Ok(KeyWriteGuard { key: Arc::from(key), inner: guard }),
        }
    }

    async fn await_read(
        &self,
        ctx: &LockContext,
        key: &[u8],
        cell: KeyCell,
    ) -> Result<KeyReadGuard, SpinelDBError> {
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(SpinelDBError::LockTimeout(String::from_utf8_lossy(key).into_owned())),
            () = tokio::time::sleep(ctx.deadline) => Err(SpinelDBError::LockTimeout(String::from_utf8_lossy(key).into_owned())),
            guard = cell.clone().read_owned() => Ok(KeyReadGuard { key: Arc::from(key), inner: guard }),
        }
    }

    /// Samples up to `n` keys uniformly at random, used by active TTL
    /// expiration. Cheap and approximate; callers re-sample in a loop.
    pub fn sample_keys(&self, n: usize) -> Vec<Arc<[u8]>> {
        use rand::seq::IteratorRandom;
        let mut rng = rand::thread_rng();
        self.table
            .iter()
            .map(|e| e.key().clone())
            .choose_multiple(&mut rng, n)
    }
}
