// src/core/acl/mod.rs

//! Access control: per-connection identity, command/category authorization,
//! key-pattern and channel-pattern gating. `Acl` is the process-wide store
//! of users and rules; `AclContext` is the lightweight, per-invocation view
//! handed to a command handler (its resolved identity for that call).

pub mod enforcer;
pub mod parsed_rules;
pub mod rules;
pub mod user;

pub use enforcer::AclEnforcer;
pub use rules::AclRule;
pub use user::AclUser;

use crate::core::errors::SpinelDBError;
use argon2::password_hash::{PasswordHash, PasswordVerifier};
use argon2::Argon2;
use dashmap::DashMap;

/// Process-wide ACL state: configured users plus the rule enforcer built
/// from them at startup (or reload).
pub struct Acl {
    enforcer: AclEnforcer,
    users: DashMap<String, AclUser>,
}

impl Acl {
    pub fn new(enabled: bool, rules: Vec<AclRule>, users: Vec<AclUser>) -> Self {
        let map = DashMap::new();
        map.insert("default".to_string(), AclUser::default_user());
        for user in users {
            map.insert(user.username.clone(), user);
        }
        Self {
            enforcer: AclEnforcer::new(enabled, &rules),
            users: map,
        }
    }

    /// Attaches the default identity to a newly accepted connection.
    pub fn register(&self) -> String {
        "default".to_string()
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<(), SpinelDBError> {
        let user = self.users.get(username).ok_or(SpinelDBError::UserNotFound)?;
        let Some(hash) = &user.password_hash else {
            // A user configured with no password hash accepts any password,
            // matching a "nopass" ACL user.
            return if user.enabled {
                Ok(())
            } else {
                Err(SpinelDBError::InvalidPassword)
            };
        };
        if !user.enabled {
            return Err(SpinelDBError::InvalidPassword);
        }
        let parsed = PasswordHash::new(hash).map_err(|_| SpinelDBError::InvalidPassword)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| SpinelDBError::InvalidPassword)
    }

    pub fn user(&self, username: &str) -> Option<AclUser> {
        self.users.get(username).map(|u| u.value().clone())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn authorize(
        &self,
        username: &str,
        raw_args: &[String],
        command_name: &str,
        categories: &[&str],
        read_keys: &[String],
        write_keys: &[String],
        pubsub_channels: &[String],
    ) -> Result<(), SpinelDBError> {
        let user = self.users.get(username);
        let allowed = self.enforcer.check_permission(
            user.as_deref(),
            raw_args,
            command_name,
            categories,
            read_keys,
            write_keys,
            pubsub_channels,
        );
        if allowed {
            Ok(())
        } else {
            Err(SpinelDBError::AclDenied(format!(
                "this user has no permissions to run the '{}' command",
                command_name.to_ascii_lowercase()
            )))
        }
    }
}

/// The resolved identity for a single command invocation, handed to command
/// handlers that need to know who they're running as (e.g. `ACL WHOAMI`).
#[derive(Clone)]
pub struct AclContext {
    pub username: String,
}

impl AclContext {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}
