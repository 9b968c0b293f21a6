//! Mercury Chat Server - Entry Point
//!
//! A line-oriented TCP chat server: clients pick a username, then every line
//! they send is relayed to all connected clients.

use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use mercury_chat::Server;
use mercury_chat::protocol::ProtocolConfig;
use mercury_chat::protocol::config::DEFAULT_PROTOCOL_PATH;
use mercury_chat::server::ServerConfig;
use mercury_chat::server::config::DEFAULT_CONFIG_PATH;
use mercury_chat::utils::logging::setup_logging;

#[derive(Parser, Debug)]
#[command(name = "mercury-server", about = "Line-oriented TCP chat server")]
struct Cli {
    /// Server settings file (optional, defaults apply when missing)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Protocol file with the handshake replies (required)
    #[arg(long, default_value = DEFAULT_PROTOCOL_PATH)]
    protocol: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    // RUST_LOG overrides the default `info` filter
    setup_logging();
    let cli = Cli::parse();

    info!("Launching chat server...");

    let protocol = match ProtocolConfig::load(&cli.protocol) {
        Ok(protocol) => protocol,
        Err(e) => {
            error!(
                "Cannot start without protocol strings from '{}': {}",
                cli.protocol, e
            );
            return ExitCode::FAILURE;
        }
    };

    let config = ServerConfig::load(&cli.config);

    let server = match Server::bind(config, protocol).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    server.start().await;
    ExitCode::SUCCESS
}
