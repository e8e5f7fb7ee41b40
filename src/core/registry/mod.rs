// src/core/registry/mod.rs

//! Runtime, case-insensitive command registry. `register` is last-write-wins
//! so a dynamically loaded module can override a built-in of the same name,
//! which is how module loading is expressed here instead of as a separate
//! code path.

pub mod command_spec;

pub use command_spec::{CommandFlags, CommandOrigin, PluginCommandSpec, KeySet, SharedCommand};

use dashmap::DashMap;

#[derive(Default)]
pub struct CommandRegistry {
    commands: DashMap<String, SharedCommand>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: DashMap::new(),
        }
    }

    pub fn register(&self, command: SharedCommand) {
        self.commands
            .insert(command.name().to_ascii_uppercase(), command);
    }

    pub fn lookup(&self, name: &str) -> Option<SharedCommand> {
        self.commands
            .get(&name.to_ascii_uppercase())
            .map(|e| e.value().clone())
    }

    pub fn resolve_subcommand<'a>(
        &self,
        command: &'a SharedCommand,
        raw: &[bytes::Bytes],
    ) -> Option<&'a command_spec::SubcommandSpec> {
        let sub_name = raw.get(1)?;
        let sub_name = std::str::from_utf8(sub_name).ok()?;
        command
            .subcommands()
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(sub_name))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.commands.iter().map(|e| e.key().clone()).collect()
    }
}
