// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::error::Error as StdError;
use std::num::{ParseFloatError, ParseIntError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum SpinelDBError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Incomplete data in stream")]
    IncompleteData,

    #[error("IO Error: {0}")]
    IoString(String),

    #[error("HTTP client error: {0}")]
    HttpClientError(String),

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Syntax error")]
    SyntaxError,

    #[error("Wrong number of arguments for '{0}' command")]
    WrongArgumentCount(String),

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("Value is not an integer or out of range")]
    NotAnInteger,

    #[error("value is not a valid float")]
    NotAFloat,

    #[error("Increment or decrement would overflow")]
    Overflow,

    #[error("Key not found")]
    KeyNotFound,

    #[error("Key already exists")]
    KeyExists,

    #[error("NOAUTH Authentication required")]
    AuthRequired,

    #[error("NOPERmission command not allowed")]
    NoPermission,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Security violation: {0}")]
    SecurityViolation(String),

    #[error("WRONGPASS invalid password")]
    InvalidPassword,

    #[error("Command not allowed in the current state: {0}")]
    InvalidState(String),

    #[error("Transaction aborted (WATCH failed)")]
    TransactionAborted,

    #[error("OOM command not allowed when used memory > 'maxmemory'")]
    MaxMemoryReached,

    #[error("READONLY {0}")]
    ReadOnly(String),

    #[error("Persistence Error: {0}")]
    AofError(String),

    #[error("Replication Error: {0}")]
    ReplicationError(String),

    #[error("Locking Error: {0}")]
    LockingError(String),

    #[error("Migration Error: {0}")]
    MigrationError(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("-NOGROUP No such consumer group")]
    ConsumerGroupNotFound,

    #[error("Could not REPLICATE: replication loop detected")]
    ReplicationLoopDetected,

    #[error("Script timed out")]
    ScriptTimeout,

    // --- Cluster-specific errors ---
    /// A redirect error indicating that a key/slot has moved to a different node.
    #[error("MOVED {slot} {addr}")]
    Moved { slot: u16, addr: String },

    /// A temporary redirect error for a slot that is currently being migrated.
    #[error("ASK {slot} {addr}")]
    Ask { slot: u16, addr: String },

    /// A multi-key command was attempted on keys in different slots.
    #[error("CROSSSLOT Keys in request don't hash to the same slot")]
    CrossSlot,

    /// An error indicating that the cluster is down or a slot is unassigned.
    #[error("CLUSTERDOWN {0}")]
    ClusterDown(String),

    // --- Keyspace / registry / ACL / replication-coupler errors ---
    /// A malformed request the frame decoder couldn't turn into a command.
    #[error("Error {0}")]
    ProtocolError(String),

    /// ACL rejection carrying the specific reason, as opposed to the
    /// fixed-text `NoPermission` the legacy ACL pipeline returns.
    #[error("NOPERM {0}")]
    AclDenied(String),

    #[error("ERR user not found")]
    UserNotFound,

    /// Key-lock acquisition was cancelled or exceeded its deadline.
    #[error("lock acquisition cancelled or timed out on key '{0}'")]
    LockTimeout(String),

    /// A mutating command reached a node that isn't the consensus leader.
    #[error("Error not cluster leader, cannot carry out command")]
    NotLeader,

    /// A replication proposal wasn't applied within its deadline.
    #[error("Error replication proposal timed out after {0:?}")]
    ReplicationTimeout(Duration),

    /// An `ApplyRecord` could not be marshaled for the consensus log.
    #[error("Error could not parse request: {0}")]
    ReplicationMarshal(String),
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
// We wrap it in an Arc to allow for cheap, shared cloning.
impl Clone for SpinelDBError {
    fn clone(&self) -> Self {
        match self {
            Self::Io(e) => Self::Io(Arc::clone(e)),
            Self::IncompleteData => Self::IncompleteData,
            Self::IoString(s) => Self::IoString(s.clone()),
            Self::HttpClientError(s) => Self::HttpClientError(s.clone()),
            Self::UnknownCommand(s) => Self::UnknownCommand(s.clone()),
            Self::SyntaxError => Self::SyntaxError,
            Self::WrongArgumentCount(s) => Self::WrongArgumentCount(s.clone()),
            Self::WrongType => Self::WrongType,
            Self::NotAnInteger => Self::NotAnInteger,
            Self::NotAFloat => Self::NotAFloat,
            Self::Overflow => Self::Overflow,
            Self::KeyNotFound => Self::KeyNotFound,
            Self::KeyExists => Self::KeyExists,
            Self::AuthRequired => Self::AuthRequired,
            Self::NoPermission => Self::NoPermission,
            Self::InvalidRequest(s) => Self::InvalidRequest(s.clone()),
            Self::SecurityViolation(s) => Self::SecurityViolation(s.clone()),
            Self::InvalidPassword => Self::InvalidPassword,
            Self::InvalidState(s) => Self::InvalidState(s.clone()),
            Self::TransactionAborted => Self::TransactionAborted,
            Self::MaxMemoryReached => Self::MaxMemoryReached,
            Self::ReadOnly(s) => Self::ReadOnly(s.clone()),
            Self::AofError(s) => Self::AofError(s.clone()),
            Self::ReplicationError(s) => Self::ReplicationError(s.clone()),
            Self::LockingError(s) => Self::LockingError(s.clone()),
            Self::MigrationError(s) => Self::MigrationError(s.clone()),
            Self::Internal(s) => Self::Internal(s.clone()),
            Self::ConsumerGroupNotFound => Self::ConsumerGroupNotFound,
            Self::ReplicationLoopDetected => Self::ReplicationLoopDetected,
            Self::ScriptTimeout => Self::ScriptTimeout,
            Self::Moved { slot, addr } => Self::Moved {
                slot: *slot,
                addr: addr.clone(),
            },
            Self::Ask { slot, addr } => Self::Ask {
                slot: *slot,
                addr: addr.clone(),
            },
            Self::CrossSlot => Self::CrossSlot,
            Self::ClusterDown(s) => Self::ClusterDown(s.clone()),
            Self::ProtocolError(s) => Self::ProtocolError(s.clone()),
            Self::AclDenied(s) => Self::AclDenied(s.clone()),
            Self::UserNotFound => Self::UserNotFound,
            Self::LockTimeout(s) => Self::LockTimeout(s.clone()),
            Self::NotLeader => Self::NotLeader,
            Self::ReplicationTimeout(d) => Self::ReplicationTimeout(*d),
            Self::ReplicationMarshal(s) => Self::ReplicationMarshal(s.clone()),
        }
    }
}

impl PartialEq for SpinelDBError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Io(a), Self::Io(b)) => a.to_string() == b.to_string(),
            (Self::IoString(a), Self::IoString(b)) => a == b,
            (Self::HttpClientError(a), Self::HttpClientError(b)) => a == b,
            (Self::UnknownCommand(a), Self::UnknownCommand(b)) => a == b,
            (Self::WrongArgumentCount(a), Self::WrongArgumentCount(b)) => a == b,
            (Self::InvalidRequest(a), Self::InvalidRequest(b)) => a == b,
            (Self::SecurityViolation(a), Self::SecurityViolation(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::ReadOnly(a), Self::ReadOnly(b)) => a == b,
            (Self::AofError(a), Self::AofError(b)) => a == b,
            (Self::ReplicationError(a), Self::ReplicationError(b)) => a == b,
            (Self::LockingError(a), Self::LockingError(b)) => a == b,
            (Self::MigrationError(a), Self::MigrationError(b)) => a == b,
            (Self::Internal(a), Self::Internal(b)) => a == b,
            (Self::ClusterDown(a), Self::ClusterDown(b)) => a == b,
            (Self::Moved { slot: s1, addr: a1 }, Self::Moved { slot: s2, addr: a2 }) => {
                s1 == s2 && a1 == a2
            }
            (Self::Ask { slot: s1, addr: a1 }, Self::Ask { slot: s2, addr: a2 }) => {
                s1 == s2 && a1 == a2
            }
            (Self::ProtocolError(a), Self::ProtocolError(b)) => a == b,
            (Self::AclDenied(a), Self::AclDenied(b)) => a == b,
            (Self::LockTimeout(a), Self::LockTimeout(b)) => a == b,
            (Self::ReplicationTimeout(a), Self::ReplicationTimeout(b)) => a == b,
            (Self::ReplicationMarshal(a), Self::ReplicationMarshal(b)) => a == b,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for SpinelDBError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(Arc::new(e))
    }
}

impl From<reqwest::Error> for SpinelDBError {
    fn from(e: reqwest::Error) -> Self {
        Self::HttpClientError(e.to_string())
    }
}

impl From<uuid::Error> for SpinelDBError {
    fn from(e: uuid::Error) -> Self {
        Self::Internal(format!("Failed to generate UUID: {e}"))
    }
}

impl From<std::str::Utf8Error> for SpinelDBError {
    fn from(_: std::str::Utf8Error) -> Self {
        Self::WrongType
    }
}

impl From<std::string::FromUtf8Error> for SpinelDBError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        Self::WrongType
    }
}

impl From<String> for SpinelDBError {
    fn from(s: String) -> Self {
        Self::IoString(s)
    }
}

impl From<ParseIntError> for SpinelDBError {
    fn from(_: ParseIntError) -> Self {
        Self::NotAnInteger
    }
}

impl From<ParseFloatError> for SpinelDBError {
    fn from(_: ParseFloatError) -> Self {
        Self::NotAFloat
    }
}

impl From<mlua::Error> for SpinelDBError {
    fn from(e: mlua::Error) -> Self {
        let mut source: Option<&(dyn StdError + 'static)> = e.source();
        while let Some(err) = source {
            if let Some(store_err) = err.downcast_ref::<SpinelDBError>() {
                return store_err.clone();
            }
            source = err.source();
        }
        Self::Internal(format!("Lua error: {e}"))
    }
}

impl From<serde_json::Error> for SpinelDBError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Renders an error the way the protocol wants it on the wire. `UnknownCommand`
/// gets the exact phrasing the dispatcher's command-not-found path promises
/// (`command X not supported`) rather than its more verbose `Display` text;
/// every other variant's `Display` impl already is the wire text. The
/// trailing extra `\n` after the `\r\n` on error lines is handled separately
/// by the frame encoder (see `protocol::resp_frame`) and is intentional and
/// load-bearing for existing clients.
impl SpinelDBError {
    pub fn client_message(&self) -> String {
        match self {
            Self::UnknownCommand(name) => format!("command {name} not supported"),
            other => other.to_string(),
        }
    }
}
