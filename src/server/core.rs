use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::client::{SessionRegistry, handle_client};
use crate::commands::CommandTable;
use crate::error::Result;
use crate::protocol::ProtocolConfig;
use crate::protocol::messages::SERVER_FULL;
use crate::server::config::ServerConfig;
use crate::server::state::ServerState;

pub struct Server {
    listener: TcpListener,
    state: Arc<ServerState>,
    connection_slots: Arc<Semaphore>,
}

impl Server {
    /// Binds the listening socket with the built-in command table.
    pub async fn bind(config: ServerConfig, protocol: ProtocolConfig) -> Result<Self> {
        Self::bind_with_commands(config, protocol, CommandTable::builtin()).await
    }

    pub async fn bind_with_commands(
        config: ServerConfig,
        protocol: ProtocolConfig,
        commands: CommandTable,
    ) -> Result<Self> {
        let socket = config.listen_socket();

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e.into());
            }
        };

        let connection_slots = Arc::new(Semaphore::new(config.max_connections));

        Ok(Self {
            listener,
            state: Arc::new(ServerState::new(config, protocol, commands)),
            connection_slots,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the live session registry.
    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.state.registry)
    }

    /// Runs the accept loop forever.
    pub async fn start(self) {
        info!(
            "Starting Mercury chat server on {} (max {} connections)",
            self.state.config.listen_socket(),
            self.state.config.max_connections
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => self.spawn_connection(stream, addr),
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let permit = match Arc::clone(&self.connection_slots).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!(
                    "Refusing {}: {} connections already open",
                    addr, self.state.config.max_connections
                );
                tokio::spawn(refuse_connection(stream, addr));
                return;
            }
        };

        info!("New client attempting connection from {}", addr);
        let state = Arc::clone(&self.state);

        // Spawn a task for each client so the accept loop doesn't block
        tokio::spawn(async move {
            handle_client(stream, addr, state).await;
            drop(permit);
        });
    }
}

async fn refuse_connection(mut stream: TcpStream, addr: SocketAddr) {
    let line = format!("{SERVER_FULL}\n");

    if let Err(e) = stream.write_all(line.as_bytes()).await {
        debug!("Could not notify {} of full server: {}", addr, e);
    }
    let _ = stream.shutdown().await;
}
