//! Server-originated lines
//!
//! Formats everything the server writes that is not a handshake string.
//! Notices are wrapped in `<<...>>` so clients can tell them apart from
//! chat lines.

/// Sent once after a successful handshake.
pub const WELCOME_MESSAGE: &str =
    "<<Welcome to the chat server! Type >>help for a list of commands.>>";

/// Sent to a connection refused because the server is at capacity.
pub const SERVER_FULL: &str = "<<Server full, try again later>>";

/// Sent to the author of a line longer than the configured limit.
pub const MESSAGE_TOO_LONG: &str = "<<message too long>>";

/// A chat line as relayed to every session.
pub fn chat_line(username: &str, line: &str) -> String {
    format!("{username}: {line}")
}

pub fn connected_notice(username: &str) -> String {
    format!("<<{username} connected>>")
}

pub fn disconnected_notice(username: &str) -> String {
    format!("<<{username} disconnected>>")
}

pub fn unrecognized_command(name: &str) -> String {
    format!("<<unrecognized command: {name}>>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_are_wrapped() {
        assert_eq!(connected_notice("alice"), "<<alice connected>>");
        assert_eq!(disconnected_notice("bob"), "<<bob disconnected>>");
        assert_eq!(unrecognized_command("dance"), "<<unrecognized command: dance>>");
    }

    #[test]
    fn chat_line_keeps_text_verbatim() {
        assert_eq!(chat_line("alice", ">>help"), "alice: >>help");
        assert_eq!(chat_line("alice", ""), "alice: ");
    }
}
