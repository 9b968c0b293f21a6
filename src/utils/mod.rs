//! Utility functions
//!
//! Provides logging setup shared by the server and client binaries.

pub mod logging;
