// src/core/keyspace/value.rs

//! The value types a key can hold, plus expiry bookkeeping.

use bytes::Bytes;
use ordered_float::OrderedFloat;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

/// A point in time expressed as milliseconds since the epoch, used instead of
/// `Instant` because it must survive JSON round-tripping through
/// `ApplyRecord`s and be identical across replicas.
pub type UnixMillis = u64;

pub fn now_millis() -> UnixMillis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as u64
}

/// A member of a sorted set, ordered by score then lexicographically by
/// member so a `BTreeSet<SortedSetEntry>` iterates in the order the spec's
/// data model requires.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortedSetEntry {
    pub score: OrderedFloat<f64>,
    pub member: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Bytes(Bytes),
    List(VecDeque<Bytes>),
    Set(indexmap::IndexSet<Bytes>),
    SortedSet(BTreeSet<SortedSetEntry>),
    Hash(HashMap<Bytes, Bytes>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "string",
            Value::Bytes(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::SortedSet(_) => "zset",
            Value::Hash(_) => "hash",
        }
    }

    pub fn as_bytes(&self) -> Option<Bytes> {
        match self {
            Value::Bytes(b) => Some(b.clone()),
            Value::Integer(i) => Some(Bytes::from(i.to_string())),
            _ => None,
        }
    }
}

/// A stored entry: the value plus an optional absolute expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub value: Value,
    pub expires_at: Option<UnixMillis>,
}

impl Entry {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    pub fn is_expired_at(&self, now: UnixMillis) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}
