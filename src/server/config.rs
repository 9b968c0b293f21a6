//! Server configuration
//!
//! Loads listener and session settings from an optional TOML file layered
//! under `MERCURY_*` environment variables. Every key is read on its own: a
//! missing or invalid value is replaced by its default and a warning is
//! logged, so a bad config file never stops the server from starting.

use config::{Config, ConfigError, Environment, File};
use log::warn;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::time::Duration;

/// Default config file, resolved by the `config` crate (`mercury.toml`).
pub const DEFAULT_CONFIG_PATH: &str = "mercury";

/// Environment prefix, e.g. `MERCURY_PORT=5000`.
const ENV_PREFIX: &str = "MERCURY";

/// Server configuration structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// IP address the listener binds to
    pub bind_address: String,
    /// Listening port; 0 asks the OS for an ephemeral port
    pub port: u16,
    /// Ceiling on simultaneously open client connections
    pub max_connections: usize,
    /// Longest accepted username, in characters
    pub max_username_length: usize,
    /// Characters that may not appear in a username
    pub illegal_characters: String,
    /// Longest accepted chat line, in characters
    pub max_message_length: usize,
    /// Seconds a new connection may take to send its username
    pub username_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 4444,
            max_connections: 64,
            max_username_length: 15,
            illegal_characters: "/\\".to_string(),
            max_message_length: 1024,
            username_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `path` with environment overrides.
    ///
    /// Falls back to [`ServerConfig::default`] when the file cannot be parsed.
    pub fn load(path: &str) -> Self {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build();

        match settings {
            Ok(settings) => Self::from_settings(&settings),
            Err(e) => {
                warn!(
                    "Failed to read server configuration from '{}': {}. Using defaults",
                    path, e
                );
                Self::default()
            }
        }
    }

    /// Build a configuration from already collected settings.
    pub fn from_settings(settings: &Config) -> Self {
        let defaults = Self::default();

        Self {
            bind_address: read_setting(settings, "bind_address", defaults.bind_address, |v| {
                !v.trim().is_empty()
            }),
            port: read_setting(settings, "port", defaults.port, |_| true),
            max_connections: read_setting(
                settings,
                "max_connections",
                defaults.max_connections,
                |v| *v > 0,
            ),
            max_username_length: read_setting(
                settings,
                "max_username_length",
                defaults.max_username_length,
                |v| *v > 0,
            ),
            illegal_characters: read_setting(
                settings,
                "illegal_characters",
                defaults.illegal_characters,
                |_| true,
            ),
            max_message_length: read_setting(
                settings,
                "max_message_length",
                defaults.max_message_length,
                |v| *v > 0,
            ),
            username_timeout_secs: read_setting(
                settings,
                "username_timeout_secs",
                defaults.username_timeout_secs,
                |v| *v > 0,
            ),
        }
    }

    pub fn username_timeout(&self) -> Duration {
        Duration::from_secs(self.username_timeout_secs)
    }

    /// Bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn read_setting<T>(settings: &Config, key: &str, default: T, is_valid: impl Fn(&T) -> bool) -> T
where
    T: DeserializeOwned + Debug,
{
    match settings.get::<T>(key) {
        Ok(value) if is_valid(&value) => value,
        Ok(value) => {
            warn!(
                "Invalid value {:?} for '{}', using default {:?}",
                value, key, default
            );
            default
        }
        Err(ConfigError::NotFound(_)) => {
            warn!("Missing '{}' setting, using default {:?}", key, default);
            default
        }
        Err(e) => {
            warn!("Could not read '{}' ({}), using default {:?}", key, e, default);
            default
        }
    }
}
