// src/core/acl/rules.rs

use serde::{Deserialize, Serialize};

/// Specifies the target of a dynamic condition.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "kebab-case", tag = "on")]
pub enum ConditionTarget {
    Key { index: usize },
    Arg { index: usize },
    Command,
}

/// The comparison operator for a dynamic condition.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "kebab-case", tag = "operator", content = "value")]
pub enum ConditionOperator {
    StartsWith(String),
    Equals(String),
    IsNumber,
    ArgcLessThan(usize),
    ArgcGreaterThan(usize),
}

/// A single, evaluatable condition within an ACL rule.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AclCondition {
    pub target: ConditionTarget,
    pub operator: ConditionOperator,
    /// Rules to apply if the condition is true (e.g. "+@write", "-DEL").
    pub result: Vec<String>,
}

/// A named, reusable ACL rule, as configured on disk.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AclRule {
    pub name: String,
    pub commands: Option<Vec<String>>,
    pub keys: Option<Vec<String>>,
    pub pubsub_channels: Option<Vec<String>>,
    #[serde(default)]
    pub conditions: Vec<AclCondition>,
}
