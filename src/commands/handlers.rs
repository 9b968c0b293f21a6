//! Built-in command handlers
//!
//! Each handler is a plain function of the command context. Teardown after
//! `quit` is done by the connection handler, not here.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::commands::CommandContext;
use crate::protocol::COMMAND_PREFIX;

/// Lists every registered command.
pub fn help(ctx: &CommandContext<'_>) -> String {
    let mut lines = vec!["Server Commands:".to_string()];
    lines.extend(ctx.commands.names().map(|name| format!("{COMMAND_PREFIX}{name}")));
    lines.join("\n")
}

/// Acknowledges a quit request.
pub fn quit(_ctx: &CommandContext<'_>) -> String {
    "<<Closing connection...>>".to_string()
}

/// Current server time as milliseconds since the Unix epoch.
pub fn time(_ctx: &CommandContext<'_>) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("Server Time: {millis}")
}

/// Lists the usernames of all active sessions, one per line.
pub fn view_members(ctx: &CommandContext<'_>) -> String {
    let mut lines = vec!["Active Members:".to_string()];
    lines.extend(ctx.registry.list_usernames());
    lines.join("\n")
}
