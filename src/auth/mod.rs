//! Username admission
//!
//! Checks a proposed username against the configured policy before the
//! registry is consulted for uniqueness.

pub mod validator;

pub use validator::validate_username;
