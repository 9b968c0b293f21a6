//! Command table
//!
//! Maps a command name to the function that handles it. Adding a command
//! means registering one more entry; nothing is discovered at runtime.

use std::collections::BTreeMap;

use crate::client::SessionRegistry;
use crate::commands::handlers;

/// Name of the command that ends a session.
pub const QUIT: &str = "quit";

/// Everything a command may look at.
pub struct CommandContext<'a> {
    pub registry: &'a SessionRegistry,
    pub username: &'a str,
    pub commands: &'a CommandTable,
}

/// A command handler. The returned text goes to the invoking client only.
pub type CommandFn = fn(&CommandContext<'_>) -> String;

#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    commands: BTreeMap<&'static str, CommandFn>,
}

impl CommandTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table with every built-in command registered.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.register("help", handlers::help);
        table.register(QUIT, handlers::quit);
        table.register("time", handlers::time);
        table.register("viewMembers", handlers::view_members);
        table
    }

    /// Adds or replaces the handler for `name`.
    pub fn register(&mut self, name: &'static str, handler: CommandFn) {
        self.commands.insert(name, handler);
    }

    /// Registered command names in listing order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// Runs `name` for `username`; `None` if no such command exists.
    pub fn dispatch(
        &self,
        name: &str,
        registry: &SessionRegistry,
        username: &str,
    ) -> Option<String> {
        let handler = self.commands.get(name)?;
        let context = CommandContext {
            registry,
            username,
            commands: self,
        };
        Some(handler(&context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whoami(ctx: &CommandContext<'_>) -> String {
        format!("you are {}", ctx.username)
    }

    #[test]
    fn unknown_command_yields_none() {
        let registry = SessionRegistry::new();
        let table = CommandTable::builtin();
        assert_eq!(table.dispatch("dance", &registry, "alice"), None);
        assert_eq!(table.dispatch("", &registry, "alice"), None);
    }

    #[test]
    fn names_are_case_sensitive() {
        let registry = SessionRegistry::new();
        let table = CommandTable::builtin();
        assert!(table.dispatch("viewMembers", &registry, "alice").is_some());
        assert_eq!(table.dispatch("viewmembers", &registry, "alice"), None);
    }

    #[test]
    fn registered_commands_are_dispatched() {
        let registry = SessionRegistry::new();
        let mut table = CommandTable::builtin();
        table.register("whoami", whoami);

        assert_eq!(
            table.dispatch("whoami", &registry, "bob"),
            Some("you are bob".to_string())
        );
        assert!(table.names().any(|name| name == "whoami"));
    }

    #[test]
    fn builtin_table_lists_all_commands() {
        let names: Vec<_> = CommandTable::builtin().names().collect();
        assert_eq!(names, vec!["help", "quit", "time", "viewMembers"]);
    }
}
