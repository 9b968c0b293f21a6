//! Terminal chat client
//!
//! Connects to a chat server, performs the username handshake, and bridges
//! a line-oriented input/output pair (normally stdin/stdout) to the socket.

pub mod connection;

pub use connection::ChatConnection;
