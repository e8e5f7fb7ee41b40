// src/core/acl/enforcer.rs

//! Evaluates parsed ACL rules against an attempted command. The enforcer is
//! a pure filter: it never parses command semantics itself, only the key
//! set and categories each `CommandSpec` already exposes.

use super::parsed_rules::{
    AclCommandRule, AclKeyRule, AclPubSubRule, ParsedAclCondition, ParsedAclRule,
};
use super::rules::{AclRule, ConditionOperator, ConditionTarget};
use super::user::AclUser;
use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Default)]
pub struct AclEnforcer {
    enabled: bool,
    rules: HashMap<String, ParsedAclRule>,
}

impl AclEnforcer {
    pub fn new(enabled: bool, rules: &[AclRule]) -> Self {
        let mut rules_map = HashMap::new();
        for rule in rules {
            let mut parsed = ParsedAclRule {
                name: rule.name.clone(),
                ..Default::default()
            };

            if let Some(commands) = &rule.commands {
                for cmd_rule in commands {
                    parsed.commands.push(Self::parse_command_rule(cmd_rule));
                }
            }
            if let Some(keys) = &rule.keys {
                for pattern in keys {
                    if let Some(r) = Self::parse_key_pattern(pattern) {
                        parsed.keys.push(r);
                    } else if pattern.eq_ignore_ascii_case("allkeys") {
                        parsed.keys.push(AclKeyRule::All);
                    }
                }
            }
            if let Some(channels) = &rule.pubsub_channels {
                for pattern in channels {
                    if let Some(r) = Self::parse_pubsub_pattern(pattern) {
                        parsed.pubsub_channels.push(r);
                    } else if pattern.eq_ignore_ascii_case("allchannels") {
                        parsed.pubsub_channels.push(AclPubSubRule::All);
                    }
                }
            }
            for condition in &rule.conditions {
                parsed.conditions.push(ParsedAclCondition {
                    target: condition.target.clone(),
                    operator: condition.operator.clone(),
                    rules_on_match: condition
                        .result
                        .iter()
                        .map(|s| Self::parse_command_rule(s))
                        .collect(),
                });
            }

            rules_map.insert(rule.name.clone(), parsed);
        }

        Self {
            enabled,
            rules: rules_map,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The main permission check. `raw_args` is the full argument vector
    /// (command name included) as UTF-8-lossy strings, used by dynamic
    /// conditions only. `read_keys`/`write_keys` are checked against the
    /// user's key-pattern rules separately, per direction, rather than as
    /// one merged set.
    #[allow(clippy::too_many_arguments)]
    pub fn check_permission(
        &self,
        user: Option<&AclUser>,
        raw_args: &[String],
        command_name: &str,
        categories: &[&str],
        read_keys: &[String],
        write_keys: &[String],
        pubsub_channels: &[String],
    ) -> bool {
        if !self.enabled {
            return true;
        }
        if user.is_none() && command_name.eq_ignore_ascii_case("AUTH") {
            return true;
        }
        let Some(user) = user else {
            return false;
        };
        if !user.enabled {
            return false;
        }

        let user_rules: Vec<&ParsedAclRule> = user
            .rules
            .iter()
            .filter_map(|name| self.rules.get(name))
            .collect();

        let all_keys: Vec<String> = read_keys
            .iter()
            .chain(write_keys)
            .cloned()
            .collect();
        let mut verdict =
            self.check_static_command_permission(&user_rules, command_name, categories);
        verdict = self.check_condition_permission(
            &user_rules,
            raw_args,
            &all_keys,
            command_name,
            categories,
            verdict,
        );
        if !verdict {
            return false;
        }
        if !self.check_key_permission(&user_rules, read_keys, true) {
            return false;
        }
        if !self.check_key_permission(&user_rules, write_keys, false) {
            return false;
        }
        if !self.check_pubsub_permission(&user_rules, pubsub_channels) {
            return false;
        }
        true
    }

    fn parse_command_rule(rule_str: &str) -> AclCommandRule {
        if let Some(cat) = rule_str.strip_prefix("+@") {
            if cat.eq_ignore_ascii_case("all") {
                AclCommandRule::All
            } else {
                AclCommandRule::AllowCategory(cat.to_ascii_lowercase())
            }
        } else if let Some(cat) = rule_str.strip_prefix("-@") {
            AclCommandRule::DenyCategory(cat.to_ascii_lowercase())
        } else if let Some(cmd) = rule_str.strip_prefix('+') {
            AclCommandRule::Allow(cmd.to_string())
        } else if let Some(cmd) = rule_str.strip_prefix('-') {
            AclCommandRule::Deny(cmd.to_string())
        } else {
            AclCommandRule::Allow(rule_str.to_string())
        }
    }

    fn glob_to_regex(pattern: &str) -> Option<Regex> {
        let mut regex_pattern = String::with_capacity(pattern.len() * 2);
        regex_pattern.push('^');
        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' => regex_pattern.push_str(".*"),
                '?' => regex_pattern.push('.'),
                '[' => {
                    regex_pattern.push('[');
                    if chars.peek() == Some(&'^') {
                        regex_pattern.push('^');
                        chars.next();
                    }
                    for pc in chars.by_ref() {
                        if pc == ']' {
                            break;
                        }
                        regex_pattern.push(pc);
                    }
                    regex_pattern.push(']');
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        regex_pattern.push_str(&regex::escape(&next.to_string()));
                    }
                }
                _ => regex_pattern.push_str(&regex::escape(&c.to_string())),
            }
        }
        regex_pattern.push('$');
        match Regex::new(&regex_pattern) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!(r#"invalid ACL glob pattern "{}": {}"#, pattern, e);
                None
            }
        }
    }

    /// Parses a key-pattern token. Recognized forms: `~pat`/`!~pat` (both
    /// directions), `%R~pat`/`!%R~pat` (read-only), `%W~pat`/`!%W~pat`
    /// (write-only), `%RW~pat`/`!%RW~pat` (both, spelled explicitly).
    fn parse_key_pattern(pattern_str: &str) -> Option<AclKeyRule> {
        let (rest, allow) = if let Some(p) = pattern_str.strip_prefix('!') {
            (p, false)
        } else {
            (pattern_str, true)
        };
        let (pattern, read, write) = if let Some(p) = rest.strip_prefix("%RW~") {
            (p, true, true)
        } else if let Some(p) = rest.strip_prefix("%R~") {
            (p, true, false)
        } else if let Some(p) = rest.strip_prefix("%W~") {
            (p, false, true)
        } else if let Some(p) = rest.strip_prefix('~') {
            (p, true, true)
        } else {
            return None;
        };
        Self::glob_to_regex(pattern).map(|r| {
            if allow {
                AclKeyRule::Allow { pattern: r, read, write }
            } else {
                AclKeyRule::Deny { pattern: r, read, write }
            }
        })
    }

    fn parse_pubsub_pattern(pattern_str: &str) -> Option<AclPubSubRule> {
        let (pattern, allow) = if let Some(p) = pattern_str.strip_prefix('&') {
            (p, true)
        } else if let Some(p) = pattern_str.strip_prefix("!&") {
            (p, false)
        } else {
            return None;
        };
        Self::glob_to_regex(pattern).map(|r| {
            if allow {
                AclPubSubRule::Allow(r)
            } else {
                AclPubSubRule::Deny(r)
            }
        })
    }

    fn check_static_command_permission(
        &self,
        rules: &[&ParsedAclRule],
        cmd_name: &str,
        categories: &[&str],
    ) -> bool {
        let mut verdict = false;
        for rule in rules {
            for cmd_rule in &rule.commands {
                match cmd_rule {
                    AclCommandRule::All => verdict = true,
                    AclCommandRule::Allow(cmd) if cmd.eq_ignore_ascii_case(cmd_name) => {
                        verdict = true
                    }
                    AclCommandRule::AllowCategory(cat)
                        if categories.iter().any(|c| c.eq_ignore_ascii_case(cat)) =>
                    {
                        verdict = true
                    }
                    AclCommandRule::Deny(cmd) if cmd.eq_ignore_ascii_case(cmd_name) => {
                        return false;
                    }
                    AclCommandRule::DenyCategory(cat)
                        if categories.iter().any(|c| c.eq_ignore_ascii_case(cat)) =>
                    {
                        return false;
                    }
                    _ => {}
                }
            }
        }
        verdict
    }

    fn evaluate_operator(&self, subject: &str, operator: &ConditionOperator, argc: usize) -> bool {
        match operator {
            ConditionOperator::StartsWith(prefix) => subject.starts_with(prefix),
            ConditionOperator::Equals(value) => subject == value,
            ConditionOperator::IsNumber => subject.parse::<f64>().is_ok(),
            ConditionOperator::ArgcLessThan(v) => argc < *v,
            ConditionOperator::ArgcGreaterThan(v) => argc > *v,
        }
    }

    fn evaluate_condition(
        &self,
        condition: &ParsedAclCondition,
        raw_args: &[String],
        keys: &[String],
    ) -> bool {
        match &condition.target {
            ConditionTarget::Key { index } => {
                let subject = keys.get(*index).map(String::as_str).unwrap_or("");
                self.evaluate_operator(subject, &condition.operator, raw_args.len())
            }
            ConditionTarget::Arg { index } => {
                let subject = raw_args.get(*index).map(String::as_str).unwrap_or("");
                self.evaluate_operator(subject, &condition.operator, raw_args.len())
            }
            ConditionTarget::Command => {
                self.evaluate_operator("", &condition.operator, raw_args.len())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_condition_permission(
        &self,
        rules: &[&ParsedAclRule],
        raw_args: &[String],
        keys: &[String],
        cmd_name: &str,
        categories: &[&str],
        mut verdict: bool,
    ) -> bool {
        for rule in rules {
            for condition in &rule.conditions {
                if self.evaluate_condition(condition, raw_args, keys) {
                    for action in &condition.rules_on_match {
                        match action {
                            AclCommandRule::All
                            | AclCommandRule::Allow(_)
                            | AclCommandRule::AllowCategory(_) => verdict = true,
                            AclCommandRule::Deny(cmd) if cmd.eq_ignore_ascii_case(cmd_name) => {
                                return false;
                            }
                            AclCommandRule::DenyCategory(cat)
                                if categories.iter().any(|c| c.eq_ignore_ascii_case(cat)) =>
                            {
                                return false;
                            }
                            _ => {}
                        }
                    }
                }
            }
        }
        verdict
    }

    /// Checks `keys` against the subset of key-pattern rules that govern
    /// the requested direction (`for_read` selects read-tagged rules,
    /// otherwise write-tagged ones).
    fn check_key_permission(
        &self,
        rules: &[&ParsedAclRule],
        keys: &[String],
        for_read: bool,
    ) -> bool {
        if keys.is_empty() {
            return true;
        }
        let all_rules: Vec<_> = rules.iter().flat_map(|r| &r.keys).collect();
        if all_rules.iter().any(|r| matches!(r, AclKeyRule::All)) {
            return true;
        }
        for key in keys {
            let mut allowed = false;
            for rule in &all_rules {
                match rule {
                    AclKeyRule::Allow { pattern, read, write }
                        if (if for_read { *read } else { *write }) && pattern.is_match(key) =>
                    {
                        allowed = true
                    }
                    AclKeyRule::Deny { pattern, read, write }
                        if (if for_read { *read } else { *write }) && pattern.is_match(key) =>
                    {
                        return false;
                    }
                    _ => {}
                }
            }
            if !allowed {
                return false;
            }
        }
        true
    }

    fn check_pubsub_permission(&self, rules: &[&ParsedAclRule], channels: &[String]) -> bool {
        if channels.is_empty() {
            return true;
        }
        let all_rules: Vec<_> = rules.iter().flat_map(|r| &r.pubsub_channels).collect();
        if all_rules.iter().any(|r| matches!(r, AclPubSubRule::All)) {
            return true;
        }
        for channel in channels {
            let mut allowed = false;
            for rule in &all_rules {
                match rule {
                    AclPubSubRule::Allow(r) if r.is_match(channel) => allowed = true,
                    AclPubSubRule::Deny(r) if r.is_match(channel) => return false,
                    _ => {}
                }
            }
            if !allowed {
                return false;
            }
        }
        true
    }
}
