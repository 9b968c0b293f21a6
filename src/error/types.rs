//! Error types
//!
//! Defines the error types shared by the chat server and the terminal client.

use std::io;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Session registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Username already in use: {0}")]
    DuplicateUsername(String),
}

/// Reasons a proposed username is refused during the handshake.
///
/// Variants are listed in the order the checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsernameRejection {
    #[error("username is too long")]
    TooLong,
    #[error("username contains illegal characters")]
    IllegalCharacter,
    #[error("username is already in use")]
    Duplicate,
}

impl From<RegistryError> for UsernameRejection {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::DuplicateUsername(_) => UsernameRejection::Duplicate,
        }
    }
}

/// General chat error that encompasses all error types
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid protocol configuration: {0}")]
    InvalidProtocol(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Client is not reading, outbound queue full")]
    Backlogged,

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}
