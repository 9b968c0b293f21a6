use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::auth::validate_username;
use crate::client::session::{Outbound, Session};
use crate::commands::QUIT;
use crate::error::{Result, UsernameRejection};
use crate::protocol::messages::{
    MESSAGE_TOO_LONG, WELCOME_MESSAGE, chat_line, connected_notice, disconnected_notice,
    unrecognized_command,
};
use crate::protocol::{InboundLine, LineReader, parse_command};
use crate::server::ServerState;

/// How long a closing connection may take to flush its queued lines.
const WRITER_LINGER: Duration = Duration::from_secs(5);

/// Why an accepted session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Quit,
    Disconnected,
}

enum LineOutcome {
    Continue,
    Quit,
}

/// Handles one chat connection from handshake to teardown.
///
/// - Reads the proposed username within the configured timeout and admits
///   or rejects it.
/// - Relays every received line to all sessions and runs `>>` commands.
/// - Unregisters the session and announces the departure when done.
///
/// All writes to the client go through its [`Outbound`] writer task. No
/// inbound line is buffered past the longer of the username and message
/// limits.
pub async fn handle_client(stream: TcpStream, peer: SocketAddr, state: Arc<ServerState>) {
    let (read_half, write_half) = stream.into_split();
    let line_limit = state
        .config
        .max_username_length
        .max(state.config.max_message_length);
    let mut reader = LineReader::for_chars(read_half, line_limit);
    let (outbound, writer) = Outbound::spawn_writer(write_half, peer.to_string());

    match admit(&mut reader, &outbound, peer, &state).await {
        Ok(Some(session)) => {
            let end = match greet(&session, &state) {
                Ok(()) => run_session(&mut reader, &session, &state).await,
                Err(e) => {
                    warn!("Failed to greet {}: {}", session.username(), e);
                    SessionEnd::Disconnected
                }
            };
            close_session(session, end, &state);
        }
        Ok(None) => {}
        Err(e) => warn!("Handshake with {} failed: {}", peer, e),
    }

    drop(outbound);
    finish_writer(writer, peer).await;
}

/// Reads the username and registers a session for it.
///
/// Returns `None` when the client left early, stayed silent too long, or the
/// name was refused; a refusal line has then already been queued.
async fn admit<R>(
    reader: &mut LineReader<R>,
    outbound: &Outbound,
    peer: SocketAddr,
    state: &ServerState,
) -> Result<Option<Session>>
where
    R: AsyncRead + Unpin,
{
    let limit = state.config.username_timeout();
    let username = match timeout(limit, reader.next_line()).await {
        Ok(read) => read?,
        Err(_) => {
            info!("{} sent no username within {:?}", peer, limit);
            return Ok(None);
        }
    };

    let username = match username {
        Some(InboundLine::Text(username)) => username,
        Some(InboundLine::TooLong) => {
            warn!("Rejected oversized username from {}", peer);
            outbound.send(state.protocol.rejection_message(UsernameRejection::TooLong))?;
            return Ok(None);
        }
        None => {
            info!("{} disconnected before sending a username", peer);
            return Ok(None);
        }
    };

    let session = Session::new(username, outbound.clone());
    debug!("Got username {:?} from {}", session.username(), peer);

    // The accept line is queued under the registry lock so it is always the
    // first line the client sees.
    let accepted = state.protocol.connection_accepted.as_str();
    let admitted = validate_username(session.username(), &state.config).and_then(|()| {
        state
            .registry
            .register_then(session.clone(), |s| {
                if let Err(e) = s.send(accepted) {
                    debug!("Could not queue accept line for {}: {}", peer, e);
                }
            })
            .map_err(UsernameRejection::from)
    });

    if let Err(rejection) = admitted {
        warn!(
            "Rejected username {:?} from {}: {}",
            session.username(),
            peer,
            rejection
        );
        outbound.send(state.protocol.rejection_message(rejection))?;
        return Ok(None);
    }

    info!(
        "{} joined from {} ({} online)",
        session.username(),
        peer,
        state.registry.len()
    );
    Ok(Some(session))
}

/// Join notice to everyone, then the welcome line.
fn greet(session: &Session, state: &ServerState) -> Result<()> {
    state.registry.broadcast(&connected_notice(session.username()));
    session.send(WELCOME_MESSAGE)
}

async fn run_session<R>(
    reader: &mut LineReader<R>,
    session: &Session,
    state: &ServerState,
) -> SessionEnd
where
    R: AsyncRead + Unpin,
{
    loop {
        let read = tokio::select! {
            read = reader.next_line() => read,
            _ = session.outbound().closed() => {
                warn!("{} stopped reading, dropping connection", session.username());
                return SessionEnd::Disconnected;
            }
        };

        let outcome = match read {
            Ok(None) => {
                info!("Connection closed by {}", session.username());
                return SessionEnd::Disconnected;
            }
            Ok(Some(InboundLine::TooLong)) => session
                .send(MESSAGE_TOO_LONG)
                .map(|()| LineOutcome::Continue),
            Ok(Some(InboundLine::Text(text))) => handle_line(&text, session, state),
            Err(e) => {
                warn!("Failed to read from {}: {}", session.username(), e);
                return SessionEnd::Disconnected;
            }
        };

        match outcome {
            Ok(LineOutcome::Continue) => {}
            Ok(LineOutcome::Quit) => return SessionEnd::Quit,
            Err(e) => {
                warn!("Failed to reply to {}: {}", session.username(), e);
                return SessionEnd::Disconnected;
            }
        }
    }
}

fn handle_line(text: &str, session: &Session, state: &ServerState) -> Result<LineOutcome> {
    let username = session.username();

    if text.chars().count() > state.config.max_message_length {
        session.send(MESSAGE_TOO_LONG)?;
        return Ok(LineOutcome::Continue);
    }

    debug!("{} sent: {}", username, text);
    // Command lines are relayed verbatim too.
    state.registry.broadcast(&chat_line(username, text));

    let Some(name) = parse_command(text) else {
        return Ok(LineOutcome::Continue);
    };

    match state.commands.dispatch(name, &state.registry, username) {
        Some(reply) => {
            session.send(reply)?;
            if name == QUIT {
                return Ok(LineOutcome::Quit);
            }
        }
        None => {
            debug!("{} sent unknown command {:?}", username, name);
            session.send(unrecognized_command(name))?;
        }
    }

    Ok(LineOutcome::Continue)
}

fn close_session(session: Session, end: SessionEnd, state: &ServerState) {
    state.registry.unregister_session(session.id());

    match end {
        SessionEnd::Quit => info!("{} quit", session.username()),
        SessionEnd::Disconnected => info!("{} disconnected", session.username()),
    }

    state
        .registry
        .broadcast(&disconnected_notice(session.username()));
}

/// Waits for queued lines to be written, then lets the socket close.
async fn finish_writer(writer: JoinHandle<()>, peer: SocketAddr) {
    let abort = writer.abort_handle();

    match timeout(WRITER_LINGER, writer).await {
        Ok(Ok(())) => debug!("Closed connection to {}", peer),
        Ok(Err(e)) => warn!("Writer for {} stopped abnormally: {}", peer, e),
        Err(_) => {
            warn!("Timed out flushing lines to {}", peer);
            abort.abort();
        }
    }
}
