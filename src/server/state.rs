//! Shared server state
//!
//! Everything a connection handler needs, built once before the listener
//! starts and shared read-only through an `Arc`. The registry is the only
//! mutable part and synchronizes itself.

use std::sync::Arc;

use crate::client::SessionRegistry;
use crate::commands::CommandTable;
use crate::protocol::ProtocolConfig;
use crate::server::ServerConfig;

pub struct ServerState {
    pub registry: Arc<SessionRegistry>,
    pub commands: CommandTable,
    pub protocol: ProtocolConfig,
    pub config: ServerConfig,
}

impl ServerState {
    pub fn new(config: ServerConfig, protocol: ProtocolConfig, commands: CommandTable) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            commands,
            protocol,
            config,
        }
    }
}
