//! Client management system
//!
//! Handles chat connections, the shared session registry, and the
//! per-connection outbound writer.

pub mod handler;
pub mod registry;
pub mod session;

pub use handler::handle_client;
pub use registry::SessionRegistry;
pub use session::{Outbound, Session, SessionId};
