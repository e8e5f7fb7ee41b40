// src/core/acl/parsed_rules.rs

use crate::core::registry::CommandFlags;
use regex::Regex;

#[derive(Debug, Clone)]
pub enum AclCommandRule {
    Allow(String),
    Deny(String),
    AllowCategory(String),
    DenyCategory(String),
    All,
}

/// A key-pattern rule, tagged with which access direction(s) it governs.
/// `~pattern`/`!~pattern` (bare tilde) apply to both reads and writes;
/// `%R~`/`%W~` restrict a rule to one direction only, matching the
/// distinction SPEC_FULL.md's ACL section requires between a user's
/// readable and writable key patterns.
#[derive(Debug, Clone)]
pub enum AclKeyRule {
    Allow { pattern: Regex, read: bool, write: bool },
    Deny { pattern: Regex, read: bool, write: bool },
    All,
}

#[derive(Debug, Clone)]
pub enum AclPubSubRule {
    Allow(Regex),
    Deny(Regex),
    All,
}

#[derive(Debug, Clone)]
pub struct ParsedAclCondition {
    pub target: super::rules::ConditionTarget,
    pub operator: super::rules::ConditionOperator,
    pub rules_on_match: Vec<AclCommandRule>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedAclRule {
    pub name: String,
    pub commands: Vec<AclCommandRule>,
    pub keys: Vec<AclKeyRule>,
    pub pubsub_channels: Vec<AclPubSubRule>,
    pub conditions: Vec<ParsedAclCondition>,
}

/// Unused by the enforcer directly, kept as the shared vocabulary between
/// ACL categories and command flags for commands that declare category tags
/// by name rather than by flag.
pub fn category_name_matches(flags: CommandFlags, category: &str) -> bool {
    match category {
        "write" => flags.contains(CommandFlags::WRITE),
        "read" => flags.contains(CommandFlags::READONLY),
        "admin" => flags.contains(CommandFlags::ADMIN),
        "pubsub" => flags.contains(CommandFlags::PUBSUB),
        "connection" => flags.contains(CommandFlags::CONNECTION),
        "dangerous" => flags.contains(CommandFlags::DANGEROUS),
        _ => false,
    }
}
