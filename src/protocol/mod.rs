//! Chat line protocol
//!
//! Handshake strings, line formatting, bounded line framing and
//! command-prefix parsing.

pub mod config;
pub mod messages;
pub mod parser;
pub mod reader;

pub use self::config::{HandshakeOutcome, ProtocolConfig};
pub use parser::{COMMAND_PREFIX, parse_command};
pub use reader::{InboundLine, LineReader};
