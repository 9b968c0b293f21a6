//! Mercury chat client - terminal front end
//!
//! Connects to a Mercury chat server and relays stdin/stdout.

use clap::Parser;
use log::error;
use std::process::ExitCode;

use mercury_chat::protocol::config::DEFAULT_PROTOCOL_PATH;
use mercury_chat::protocol::{HandshakeOutcome, ProtocolConfig};
use mercury_chat::terminal::ChatConnection;
use mercury_chat::utils::logging::setup_logging;

#[derive(Parser, Debug)]
#[command(name = "mercury-client", about = "Terminal client for the Mercury chat server")]
struct Cli {
    /// Server address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 4444)]
    port: u16,

    /// Username to request
    #[arg(short, long)]
    username: String,

    /// Protocol file shared with the server
    #[arg(long, default_value = DEFAULT_PROTOCOL_PATH)]
    protocol: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();
    let cli = Cli::parse();

    let protocol = match ProtocolConfig::load(&cli.protocol) {
        Ok(protocol) => protocol,
        Err(e) => {
            error!("Cannot load protocol file '{}': {}", cli.protocol, e);
            return ExitCode::FAILURE;
        }
    };

    let addr = format!("{}:{}", cli.host, cli.port);
    let mut connection = match ChatConnection::open(&addr).await {
        Ok(connection) => connection,
        Err(e) => {
            eprintln!("Error: server unreachable ({e})");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match connection.handshake(&cli.username, &protocol).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: handshake failed ({e})");
            return ExitCode::FAILURE;
        }
    };

    let problem = match outcome {
        HandshakeOutcome::Accepted => None,
        HandshakeOutcome::DuplicateUsername => Some("duplicate username".to_string()),
        HandshakeOutcome::UsernameTooLong => {
            Some("server cannot accept a username that long".to_string())
        }
        HandshakeOutcome::IllegalUsername => {
            Some("username contains characters that the server cannot accept".to_string())
        }
        HandshakeOutcome::Unknown(reply) => {
            Some(format!("unexpected reply '{reply}', check protocol settings"))
        }
    };

    if let Some(problem) = problem {
        eprintln!("Error: {problem}.");
        return ExitCode::FAILURE;
    }

    eprintln!("Connected successfully as {}.", cli.username);

    match connection.relay(tokio::io::stdin(), tokio::io::stdout()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: lost connection to server ({e})");
            ExitCode::FAILURE
        }
    }
}
