//! Chat commands
//!
//! Lines starting with `>>` name a command. Commands are looked up in an
//! explicit table built once at startup.

pub mod handlers;
pub mod table;

pub use table::{CommandContext, CommandFn, CommandTable, QUIT};
