// src/core/dispatch/mod.rs

//! The per-connection dispatch loop: decode one frame, resolve its handler,
//! authorize it, then either run it locally or hand it to the replication
//! coupler. `crate::connection::ConnectionHandler` builds one `Dispatcher`
//! per node (via `standalone` below) and runs every live client frame
//! through `dispatch`; this module is also exercised directly by the tests
//! below, without a socket in the loop.

pub mod builtin;
pub mod connection;

use crate::core::acl::Acl;
use crate::core::errors::SpinelDBError;
use crate::core::keyspace::Keyspace;
use crate::core::protocol::{RespFrame, RespValue};
use crate::core::pubsub::engine::PubSubEngine;
use crate::core::registry::CommandRegistry;
use crate::core::replication::coupler::ReplicationCoupler;
use crate::core::replication::single_node::SingleNodeConsensusLog;
use bytes::Bytes;
use std::sync::Arc;

pub use connection::Connection;

/// A request frame is always `*N\r\n$len\r\n...` — an array of bulk
/// strings. Anything else (an inline simple-string ping, a malformed
/// frame) is a protocol error rather than a panic. Shared by every
/// transport that feeds a `Dispatcher` (the main connection loop and the
/// standalone listener alike).
pub fn frame_to_command(frame: RespFrame) -> Result<Vec<Bytes>, SpinelDBError> {
    match frame {
        RespFrame::Array(items) => items
            .into_iter()
            .map(|item| match item {
                RespFrame::BulkString(b) => Ok(b),
                _ => Err(SpinelDBError::ProtocolError(
                    "expected a bulk string array element".into(),
                )),
            })
            .collect(),
        _ => Err(SpinelDBError::ProtocolError(
            "expected a command array".into(),
        )),
    }
}

/// Rewrites a command's relative TTL option (`SET key val EX seconds` /
/// `PX milliseconds`) into its absolute-timestamp form (`PXAT ms`) by
/// resolving the wall clock here, in the client-facing handler path,
/// before the command bytes are marshaled into an `ApplyRecord`. Without
/// this, `SingleNodeConsensusLog::propose` would resolve the same relative
/// offset again whenever it (or a future real consensus log's replay)
/// applies the record, giving a different absolute expiry each time.
/// Commands this doesn't recognize are returned unchanged.
fn resolve_relative_ttl(name: &str, raw: &[Bytes]) -> Vec<Bytes> {
    if !name.eq_ignore_ascii_case("SET") || raw.len() < 5 {
        return raw.to_vec();
    }
    let Ok(opt) = std::str::from_utf8(&raw[3]) else {
        return raw.to_vec();
    };
    let opt = opt.to_ascii_uppercase();
    if opt != "EX" && opt != "PX" {
        return raw.to_vec();
    }
    let Ok(amount_str) = std::str::from_utf8(&raw[4]) else {
        return raw.to_vec();
    };
    let Ok(amount) = amount_str.parse::<u64>() else {
        return raw.to_vec();
    };
    let now = crate::core::keyspace::value::now_millis();
    let absolute = if opt == "EX" {
        now + amount * 1000
    } else {
        now + amount
    };
    let mut rewritten = raw.to_vec();
    rewritten[3] = Bytes::from_static(b"PXAT");
    rewritten[4] = Bytes::from(absolute.to_string());
    rewritten
}

/// Bundles the collaborators a dispatcher needs: nothing here is dispatcher
/// state, it is all shared across every connection on the node.
pub struct Dispatcher {
    pub registry: Arc<CommandRegistry>,
    pub acl: Arc<Acl>,
    pub keyspace: Arc<Keyspace>,
    pub coupler: Arc<ReplicationCoupler>,
    pub pubsub: Arc<PubSubEngine>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<CommandRegistry>,
        acl: Arc<Acl>,
        keyspace: Arc<Keyspace>,
        coupler: Arc<ReplicationCoupler>,
        pubsub: Arc<PubSubEngine>,
    ) -> Self {
        Self {
            registry,
            acl,
            keyspace,
            coupler,
            pubsub,
        }
    }

    /// Builds the one `Dispatcher` a node runs: a `CommandRegistry` seeded
    /// with the built-ins, an open ACL, an empty `Keyspace`, a
    /// single-node `ReplicationCoupler` and a fresh `PubSubEngine`. Shared
    /// by every transport that accepts connections for this node — the
    /// primary client listener and the standalone dispatch listener alike
    /// — so a `SET` on one is visible to a `GET` on the other.
    pub fn standalone(server_id: String) -> Arc<Self> {
        let registry = Arc::new(CommandRegistry::new());
        builtin::register_builtins(&registry);
        let acl = Arc::new(Acl::new(false, vec![], vec![]));
        let keyspace = Arc::new(Keyspace::new());
        let consensus_log = Arc::new(SingleNodeConsensusLog::new(
            registry.clone(),
            keyspace.clone(),
        ));
        let coupler = Arc::new(ReplicationCoupler::new(server_id, consensus_log));
        let pubsub = Arc::new(PubSubEngine::new());
        Arc::new(Self::new(registry, acl, keyspace, coupler, pubsub))
    }

    /// Runs one iteration of the per-connection loop against an already
    /// decoded command vector. Never returns `Err`: every failure mode the
    /// spec enumerates (unknown command, ACL denial, handler error, not
    /// leader) is turned into a `RespValue::Error` so the connection loop
    /// can write it and keep reading, matching the contract that only a
    /// transport-level I/O error closes the connection.
    ///
    /// Returns `None` for the subset of commands (`(P)SUBSCRIBE`,
    /// `(P)UNSUBSCRIBE`) whose confirmations are pushed onto the
    /// connection's outbox rather than returned directly — callers must
    /// skip writing a frame in that case instead of sending a spurious
    /// reply that would land out of order with the per-channel
    /// confirmations drained from the outbox.
    pub async fn dispatch(&self, conn: &Connection, raw: &[Bytes]) -> Option<RespValue> {
        match self.dispatch_inner(conn, raw).await {
            Ok(v) => v,
            Err(e) => Some(RespValue::Error(e.client_message())),
        }
    }

    async fn dispatch_inner(
        &self,
        conn: &Connection,
        raw: &[Bytes],
    ) -> Result<Option<RespValue>, SpinelDBError> {
        if raw.is_empty() {
            return Err(SpinelDBError::ProtocolError("empty command".into()));
        }
        let name = std::str::from_utf8(&raw[0])
            .map_err(|_| SpinelDBError::ProtocolError("command name is not valid UTF-8".into()))?;

        // AUTH and the (p)subscribe family mutate connection-local state
        // (identity, subscription membership) that no `PluginCommandSpec`
        // handler has a seam to reach — they are handled here directly,
        // the same way the base's own `Router` special-cases `PSYNC` ahead
        // of its generic command dispatch instead of forcing it through the
        // per-command trait.
        let upper_name = name.to_ascii_uppercase();
        match upper_name.as_str() {
            "AUTH" => return self.handle_auth(conn, raw).map(Some),
            "SUBSCRIBE" | "PSUBSCRIBE" | "PUBLISH" => {
                let pattern = upper_name == "PSUBSCRIBE";
                // `PUBLISH`'s second argument is the payload, not a channel
                // to check against; only SUBSCRIBE/PSUBSCRIBE's arguments
                // are all channel/pattern names.
                let channel_args: &[Bytes] = if upper_name == "PUBLISH" {
                    raw.get(1..2).unwrap_or(&[])
                } else {
                    raw.get(1..).unwrap_or(&[])
                };
                let channels: Vec<String> = channel_args
                    .iter()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .collect();
                self.acl.authorize(
                    &conn.identity(),
                    &[],
                    &upper_name,
                    &["pubsub"],
                    &[],
                    &[],
                    &channels,
                )?;
                return match upper_name.as_str() {
                    "PUBLISH" => self.handle_publish(raw).map(Some),
                    _ => {
                        self.handle_subscribe(conn, raw, pattern)?;
                        Ok(None)
                    }
                };
            }
            "UNSUBSCRIBE" => {
                self.handle_unsubscribe(conn, raw, false)?;
                return Ok(None);
            }
            "PUNSUBSCRIBE" => {
                self.handle_unsubscribe(conn, raw, true)?;
                return Ok(None);
            }
            _ => {}
        }

        let command = self
            .registry
            .lookup(name)
            .ok_or_else(|| SpinelDBError::UnknownCommand(name.to_ascii_lowercase()))?;

        // Pin the effective `sync` flag: a subcommand can override its
        // parent's replication requirement (e.g. `CONFIG GET` is local,
        // `CONFIG SET` is not in a hypothetical module).
        let effective_sync = self
            .registry
            .resolve_subcommand(&command, raw)
            .map(|sub| sub.sync)
            .unwrap_or_else(|| command.sync());

        let keys = command.extract_keys(raw);
        let raw_strings: Vec<String> = raw
            .iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect();
        let read_keys: Vec<String> = keys
            .read
            .iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect();
        let write_keys: Vec<String> = keys
            .write
            .iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect();

        self.acl.authorize(
            &conn.identity(),
            &raw_strings,
            &command.name().to_ascii_uppercase(),
            command.categories(),
            &read_keys,
            &write_keys,
            &[],
        )?;

        if effective_sync {
            let marshaled = resolve_relative_ttl(name, raw);
            self.coupler
                .submit(conn.server_id(), conn.id(), marshaled)
                .await
                .map(Some)
        } else {
            let acl_ctx = crate::core::acl::AclContext::new(conn.identity());
            command.handle(&self.keyspace, &acl_ctx, raw).await.map(Some)
        }
    }

    /// `AUTH [username] password`. On success, flips the connection's
    /// identity for every subsequent command on this connection; on
    /// failure, identity is left untouched.
    fn handle_auth(&self, conn: &Connection, raw: &[Bytes]) -> Result<RespValue, SpinelDBError> {
        let (username, password) = match raw.len() {
            2 => ("default".to_string(), &raw[1]),
            3 => (
                String::from_utf8_lossy(&raw[1]).into_owned(),
                &raw[2],
            ),
            _ => return Err(SpinelDBError::WrongArgumentCount("auth".into())),
        };
        let password = std::str::from_utf8(password)
            .map_err(|_| SpinelDBError::ProtocolError("password is not valid UTF-8".into()))?;
        self.acl.authenticate(&username, password)?;
        conn.set_identity(username);
        Ok(RespValue::SimpleString("OK".into()))
    }

    /// `(P)SUBSCRIBE channel [channel ...]`. Replies are pushed onto the
    /// connection's own outbox by `PubSubEngine::subscribe`/`psubscribe`
    /// rather than returned directly — a single command can produce one
    /// confirmation per channel, which doesn't fit the one-command/
    /// one-reply shape `dispatch` otherwise assumes. `dispatch_inner`
    /// returns `None` for this call so the caller never writes a frame of
    /// its own, leaving the outbox's per-channel confirmations as the only
    /// bytes written for this command (see the listener's connection loop).
    fn handle_subscribe(
        &self,
        conn: &Connection,
        raw: &[Bytes],
        pattern: bool,
    ) -> Result<(), SpinelDBError> {
        if raw.len() < 2 {
            return Err(SpinelDBError::WrongArgumentCount(
                if pattern { "psubscribe" } else { "subscribe" }.into(),
            ));
        }
        let names: Vec<String> = raw[1..]
            .iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect();
        if pattern {
            self.pubsub.psubscribe(conn.id(), &conn.outbox, &names);
            conn.patterns.write().extend(names);
        } else {
            self.pubsub.subscribe(conn.id(), &conn.outbox, &names);
            conn.channels.write().extend(names);
        }
        Ok(())
    }

    fn handle_unsubscribe(
        &self,
        conn: &Connection,
        raw: &[Bytes],
        pattern: bool,
    ) -> Result<(), SpinelDBError> {
        let requested: Vec<String> = raw[1..]
            .iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect();
        let names = if requested.is_empty() {
            if pattern {
                conn.patterns.read().iter().cloned().collect()
            } else {
                conn.channels.read().iter().cloned().collect()
            }
        } else {
            requested
        };
        if pattern {
            self.pubsub.punsubscribe(conn.id(), &conn.outbox, &names);
            let mut held = conn.patterns.write();
            for name in &names {
                held.remove(name);
            }
        } else {
            self.pubsub.unsubscribe(conn.id(), &conn.outbox, &names);
            let mut held = conn.channels.write();
            for name in &names {
                held.remove(name);
            }
        }
        Ok(())
    }

    fn handle_publish(&self, raw: &[Bytes]) -> Result<RespValue, SpinelDBError> {
        if raw.len() != 3 {
            return Err(SpinelDBError::WrongArgumentCount("publish".into()));
        }
        let channel = std::str::from_utf8(&raw[1])
            .map_err(|_| SpinelDBError::ProtocolError("channel is not valid UTF-8".into()))?;
        let delivered = self.pubsub.publish(channel, raw[2].clone());
        Ok(RespValue::Integer(delivered as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::{CommandFlags, PluginCommandSpec, KeySet};
    use crate::core::replication::coupler::{ApplyOutcome, ConsensusLog};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl PluginCommandSpec for Echo {
        fn name(&self) -> &str {
            "ECHO"
        }
        fn categories(&self) -> &[&'static str] {
            &["read"]
        }
        fn sync(&self) -> bool {
            false
        }
        fn flags(&self) -> CommandFlags {
            CommandFlags::READONLY
        }
        fn extract_keys(&self, _args: &[Bytes]) -> KeySet {
            KeySet::none()
        }
        async fn handle(
            &self,
            _keyspace: &Keyspace,
            _acl: &crate::core::acl::AclContext,
            args: &[Bytes],
        ) -> Result<RespValue, SpinelDBError> {
            Ok(RespValue::BulkString(
                args.get(1).cloned().unwrap_or_default(),
            ))
        }
    }

    struct AlwaysLocalConsensus;

    #[async_trait]
    impl ConsensusLog for AlwaysLocalConsensus {
        fn is_leader(&self) -> bool {
            true
        }
        async fn propose(
            &self,
            _record: crate::core::replication::coupler::ApplyRecord,
        ) -> Result<ApplyOutcome, SpinelDBError> {
            Ok(ApplyOutcome::Response(RespValue::SimpleString("OK".into())))
        }
    }

    fn build() -> Dispatcher {
        let registry = Arc::new(CommandRegistry::new());
        registry.register(Arc::new(Echo));
        let acl = Arc::new(Acl::new(false, vec![], vec![]));
        let keyspace = Arc::new(Keyspace::new());
        let coupler = Arc::new(ReplicationCoupler::new(
            "srv-1".into(),
            Arc::new(AlwaysLocalConsensus),
        ));
        let pubsub = Arc::new(PubSubEngine::new());
        Dispatcher::new(registry, acl, keyspace, coupler, pubsub)
    }

    #[tokio::test]
    async fn unknown_command_is_a_protocol_error_not_a_panic() {
        let d = build();
        let conn = Connection::new(1, "srv-1".into());
        let resp = d.dispatch(&conn, &[Bytes::from_static(b"NOSUCH")]).await.unwrap();
        assert!(matches!(resp, RespValue::Error(msg) if msg.contains("not supported") || msg.contains("unknown")));
    }

    #[tokio::test]
    async fn local_command_executes_without_touching_the_coupler() {
        let d = build();
        let conn = Connection::new(1, "srv-1".into());
        let resp = d
            .dispatch(
                &conn,
                &[Bytes::from_static(b"ECHO"), Bytes::from_static(b"hi")],
            )
            .await
            .unwrap();
        assert_eq!(resp, RespValue::BulkString(Bytes::from_static(b"hi")));
    }

    fn build_with_builtins(acl: Acl) -> Dispatcher {
        let registry = Arc::new(CommandRegistry::new());
        crate::core::dispatch::builtin::register_builtins(&registry);
        let acl = Arc::new(acl);
        let keyspace = Arc::new(Keyspace::new());
        let coupler = Arc::new(ReplicationCoupler::new(
            "srv-1".into(),
            Arc::new(AlwaysLocalConsensus),
        ));
        let pubsub = Arc::new(PubSubEngine::new());
        Dispatcher::new(registry, acl, keyspace, coupler, pubsub)
    }

    #[tokio::test]
    async fn set_through_the_coupler_is_visible_to_a_later_get() {
        let d = build_with_builtins(Acl::new(false, vec![], vec![]));
        let conn = Connection::new(1, "srv-1".into());
        let resp = d
            .dispatch(
                &conn,
                &[
                    Bytes::from_static(b"SET"),
                    Bytes::from_static(b"k"),
                    Bytes::from_static(b"v"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(resp, RespValue::SimpleString("OK".into()));

        let resp = d
            .dispatch(&conn, &[Bytes::from_static(b"GET"), Bytes::from_static(b"k")])
            .await
            .unwrap();
        assert_eq!(resp, RespValue::BulkString(Bytes::from_static(b"v")));
    }

    #[tokio::test]
    async fn auth_failure_leaves_identity_untouched() {
        let user = crate::core::acl::AclUser {
            username: "alice".into(),
            password_hash: None,
            enabled: false,
            rules: vec![],
        };
        let d = build_with_builtins(Acl::new(true, vec![], vec![user]));
        let conn = Connection::new(1, "srv-1".into());
        let resp = d
            .dispatch(
                &conn,
                &[
                    Bytes::from_static(b"AUTH"),
                    Bytes::from_static(b"alice"),
                    Bytes::from_static(b"whatever"),
                ],
            )
            .await
            .unwrap();
        assert!(matches!(resp, RespValue::Error(_)));
        assert_eq!(conn.identity(), "default");
    }

    #[test]
    fn relative_ttl_is_rewritten_to_an_absolute_timestamp() {
        let raw = vec![
            Bytes::from_static(b"SET"),
            Bytes::from_static(b"k"),
            Bytes::from_static(b"v"),
            Bytes::from_static(b"EX"),
            Bytes::from_static(b"10"),
        ];
        let rewritten = resolve_relative_ttl("SET", &raw);
        assert_eq!(rewritten[3], Bytes::from_static(b"PXAT"));
        let ms: u64 = std::str::from_utf8(&rewritten[4]).unwrap().parse().unwrap();
        let now = crate::core::keyspace::value::now_millis();
        assert!(ms > now && ms <= now + 10_000);
    }

    #[test]
    fn commands_without_a_relative_ttl_option_pass_through_unchanged() {
        let raw = vec![
            Bytes::from_static(b"SET"),
            Bytes::from_static(b"k"),
            Bytes::from_static(b"v"),
        ];
        assert_eq!(resolve_relative_ttl("SET", &raw), raw);

        let get = vec![Bytes::from_static(b"GET"), Bytes::from_static(b"k")];
        assert_eq!(resolve_relative_ttl("GET", &get), get);
    }

    #[tokio::test]
    async fn subscribe_produces_no_direct_reply_only_an_outbox_confirmation() {
        let d = build_with_builtins(Acl::new(false, vec![], vec![]));
        let conn = Connection::new(1, "srv-1".into());
        let resp = d
            .dispatch(&conn, &[Bytes::from_static(b"SUBSCRIBE"), Bytes::from_static(b"news")])
            .await;
        assert!(resp.is_none());
        assert!(conn.outbox.pop().is_some());
    }

    #[tokio::test]
    async fn subscribe_then_publish_delivers_through_the_real_pubsub_engine() {
        let d = build_with_builtins(Acl::new(false, vec![], vec![]));
        let conn = Connection::new(1, "srv-1".into());
        d.dispatch(&conn, &[Bytes::from_static(b"SUBSCRIBE"), Bytes::from_static(b"news")])
            .await;
        conn.outbox.pop(); // drain the subscribe confirmation

        let delivered = d
            .dispatch(
                &conn,
                &[
                    Bytes::from_static(b"PUBLISH"),
                    Bytes::from_static(b"news"),
                    Bytes::from_static(b"hello"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(delivered, RespValue::Integer(1));
        assert!(conn.outbox.pop().is_some());
    }
}
