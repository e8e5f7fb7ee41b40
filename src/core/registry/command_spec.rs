// src/core/registry/command_spec.rs

//! The plug-in contract every command, built-in or dynamically loaded,
//! implements. This generalizes the distilled spec's struct-of-function-
//! pointers module contract into a trait object so built-in and loaded
//! commands are registered through the same call.

use crate::core::acl::AclContext;
use crate::core::errors::SpinelDBError;
use crate::core::keyspace::Keyspace;
use crate::core::protocol::RespValue;
use async_trait::async_trait;
use bitflags::bitflags;
use bytes::Bytes;
use std::sync::Arc;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct CommandFlags: u32 {
        const WRITE       = 1 << 0;
        const READONLY    = 1 << 1;
        const ADMIN       = 1 << 2;
        const PUBSUB      = 1 << 3;
        const CONNECTION  = 1 << 4;
        const DANGEROUS   = 1 << 5;
    }
}

/// Which keys a command reads and/or writes, produced from its raw argument
/// vector. The ACL filters purely on this output; it never parses command
/// semantics itself.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    pub read: Vec<Bytes>,
    pub write: Vec<Bytes>,
}

impl KeySet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn reads(keys: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            read: keys.into_iter().collect(),
            write: Vec::new(),
        }
    }

    pub fn writes(keys: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            read: Vec::new(),
            write: keys.into_iter().collect(),
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &Bytes> {
        self.read.iter().chain(self.write.iter())
    }
}

/// Where a registered command came from. Built-in commands ship with the
/// core; loaded commands are registered at startup from a module manifest;
/// scripted commands are a fixed seam for a future embedded-language layer
/// (out of scope here, never implemented).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrigin {
    BuiltIn,
    Loaded,
    Scripted,
}

/// A single subcommand (e.g. `PUBSUB CHANNELS`), sharing the parent's name
/// but with its own ACL-relevant properties and handler.
pub struct SubcommandSpec {
    pub name: &'static str,
    pub sync: bool,
    pub categories: &'static [&'static str],
}

#[async_trait]
pub trait PluginCommandSpec: Send + Sync {
    fn name(&self) -> &str;
    fn categories(&self) -> &[&'static str];
    fn description(&self) -> &str {
        ""
    }
    /// Whether this command must be replicated through the consensus log
    /// when the server is clustered.
    fn sync(&self) -> bool;
    fn flags(&self) -> CommandFlags;
    fn subcommands(&self) -> &[SubcommandSpec] {
        &[]
    }
    fn extract_keys(&self, args: &[Bytes]) -> KeySet;

    /// `args` is the full raw command vector including the command name at
    /// index 0. The core has already resolved and locked any keys the
    /// handler needs via `keyspace` before invoking this.
    async fn handle(
        &self,
        keyspace: &Keyspace,
        acl: &AclContext,
        args: &[Bytes],
    ) -> Result<RespValue, SpinelDBError>;

    fn origin(&self) -> CommandOrigin {
        CommandOrigin::BuiltIn
    }
}

pub type SharedCommand = Arc<dyn PluginCommandSpec>;
