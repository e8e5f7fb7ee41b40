// src/core/acl/user.rs

use serde::{Deserialize, Serialize};

/// A single configured user. `password_hash` is an Argon2 PHC string; the
/// default user ships with no password requirement (`enabled` still gates
/// whether the user may do anything once ACL enforcement is on).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AclUser {
    pub username: String,
    pub password_hash: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub rules: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl AclUser {
    pub fn default_user() -> Self {
        Self {
            username: "default".to_string(),
            password_hash: None,
            enabled: true,
            rules: vec!["default".to_string()],
        }
    }
}
