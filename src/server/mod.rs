//! Server core functionality
//!
//! This module contains the listener, its configuration, and the state
//! shared by every connection handler.

pub mod config;
pub mod core;
pub mod state;

pub use self::config::ServerConfig;
pub use self::core::Server;
pub use state::ServerState;
