pub mod auth;
pub mod client;
pub mod commands;
pub mod error;
pub mod protocol;
pub mod server;
pub mod terminal;
pub mod utils;

pub use error::{ChatError, Result};
pub use server::Server;
