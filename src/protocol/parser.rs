//! Inbound line parsing
//!
//! Splits client input into plain chat and `>>`-prefixed commands.

/// Marks a line as a command.
pub const COMMAND_PREFIX: &str = ">>";

/// Returns the command name if `line` carries the command prefix.
///
/// The name is everything after the prefix, unchanged; matching is exact.
pub fn parse_command(line: &str) -> Option<&str> {
    line.strip_prefix(COMMAND_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_prefixed_commands() {
        assert_eq!(parse_command(">>help"), Some("help"));
        assert_eq!(parse_command(">>"), Some(""));
    }

    #[test]
    fn command_name_keeps_surrounding_whitespace() {
        assert_eq!(parse_command(">> viewMembers "), Some(" viewMembers "));
        assert_eq!(parse_command(">>quit "), Some("quit "));
        assert_ne!(parse_command(">> quit"), Some("quit"));
    }

    #[test]
    fn plain_lines_are_not_commands() {
        assert_eq!(parse_command("hello >>help"), None);
        assert_eq!(parse_command(" >>help"), None);
        assert_eq!(parse_command(">"), None);
        assert_eq!(parse_command(""), None);
    }
}
