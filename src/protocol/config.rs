//! Handshake protocol strings
//!
//! Server and client must agree on these four lines, so they are loaded from
//! a shared file at startup. Unlike the server settings there is no default:
//! a missing or malformed protocol file is fatal.

use config::{Config, File, FileFormat};
use serde::Deserialize;

use crate::error::{ChatError, Result, UsernameRejection};

/// Default protocol file, resolved by the `config` crate (`protocol.toml`).
pub const DEFAULT_PROTOCOL_PATH: &str = "protocol";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProtocolConfig {
    pub connection_accepted: String,
    pub duplicate_username: String,
    pub long_username: String,
    pub illegal_username: String,
}

/// How a client interprets the server's first reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Accepted,
    DuplicateUsername,
    UsernameTooLong,
    IllegalUsername,
    Unknown(String),
}

impl ProtocolConfig {
    /// Load the protocol strings from `path`. The file is required.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(true))
            .build()?;
        Self::from_settings(settings)
    }

    /// Parse protocol strings from TOML text.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self> {
        let protocol: ProtocolConfig = settings.try_deserialize()?;
        protocol.validate()?;
        Ok(protocol)
    }

    fn validate(&self) -> Result<()> {
        let entries = [
            ("connection_accepted", &self.connection_accepted),
            ("duplicate_username", &self.duplicate_username),
            ("long_username", &self.long_username),
            ("illegal_username", &self.illegal_username),
        ];

        for (key, value) in entries {
            if value.trim().is_empty() {
                return Err(ChatError::InvalidProtocol(format!("'{key}' cannot be empty")));
            }
            if value.contains(['\r', '\n']) {
                return Err(ChatError::InvalidProtocol(format!(
                    "'{key}' must fit on a single line"
                )));
            }
        }

        Ok(())
    }

    /// The line sent to a client whose username was refused.
    pub fn rejection_message(&self, rejection: UsernameRejection) -> &str {
        match rejection {
            UsernameRejection::TooLong => &self.long_username,
            UsernameRejection::IllegalCharacter => &self.illegal_username,
            UsernameRejection::Duplicate => &self.duplicate_username,
        }
    }

    /// Classify the server's handshake reply. Comparison ignores ASCII case.
    pub fn classify(&self, reply: &str) -> HandshakeOutcome {
        let reply = reply.trim_end_matches(['\r', '\n']);

        if reply.eq_ignore_ascii_case(&self.connection_accepted) {
            HandshakeOutcome::Accepted
        } else if reply.eq_ignore_ascii_case(&self.duplicate_username) {
            HandshakeOutcome::DuplicateUsername
        } else if reply.eq_ignore_ascii_case(&self.long_username) {
            HandshakeOutcome::UsernameTooLong
        } else if reply.eq_ignore_ascii_case(&self.illegal_username) {
            HandshakeOutcome::IllegalUsername
        } else {
            HandshakeOutcome::Unknown(reply.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROTOCOL: &str = r#"
        connection_accepted = "CONNECTION_ACCEPTED"
        duplicate_username = "REJECTED_DUPLICATE_USERNAME"
        long_username = "REJECTED_LONG_USERNAME"
        illegal_username = "REJECTED_ILLEGAL_USERNAME"
    "#;

    #[test]
    fn parses_all_four_strings() {
        let protocol = ProtocolConfig::from_toml_str(PROTOCOL).unwrap();
        assert_eq!(protocol.connection_accepted, "CONNECTION_ACCEPTED");
        assert_eq!(
            protocol.rejection_message(UsernameRejection::TooLong),
            "REJECTED_LONG_USERNAME"
        );
        assert_eq!(
            protocol.rejection_message(UsernameRejection::Duplicate),
            "REJECTED_DUPLICATE_USERNAME"
        );
        assert_eq!(
            protocol.rejection_message(UsernameRejection::IllegalCharacter),
            "REJECTED_ILLEGAL_USERNAME"
        );
    }

    #[test]
    fn missing_key_is_an_error() {
        let result = ProtocolConfig::from_toml_str(r#"connection_accepted = "OK""#);
        assert!(matches!(result, Err(ChatError::Config(_))));
    }

    #[test]
    fn empty_or_multiline_values_are_rejected() {
        let empty = PROTOCOL.replace("\"REJECTED_LONG_USERNAME\"", "\"\"");
        assert!(matches!(
            ProtocolConfig::from_toml_str(&empty),
            Err(ChatError::InvalidProtocol(_))
        ));

        let multiline = PROTOCOL.replace("\"CONNECTION_ACCEPTED\"", "\"OK\\nMORE\"");
        assert!(matches!(
            ProtocolConfig::from_toml_str(&multiline),
            Err(ChatError::InvalidProtocol(_))
        ));
    }

    #[test]
    fn missing_file_is_fatal() {
        let result = ProtocolConfig::load("no/such/dir/protocol");
        assert!(result.is_err());
    }

    #[test]
    fn classify_ignores_case_and_line_endings() {
        let protocol = ProtocolConfig::from_toml_str(PROTOCOL).unwrap();
        assert_eq!(
            protocol.classify("connection_accepted\r\n"),
            HandshakeOutcome::Accepted
        );
        assert_eq!(
            protocol.classify("REJECTED_ILLEGAL_USERNAME"),
            HandshakeOutcome::IllegalUsername
        );
        assert_eq!(
            protocol.classify("something else"),
            HandshakeOutcome::Unknown("something else".to_string())
        );
    }
}
