//! Configuration schema definitions.
//!
//! All types derive Serde traits so an embedding application can load them
//! from a TOML document.

use serde::{Deserialize, Serialize};

/// Settings for a single connection server.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Host name or IP literal to bind (e.g., "127.0.0.1", "::1", "localhost").
    pub host: String,

    /// Port to bind, as text. "0" asks the OS for an ephemeral port.
    pub port: String,

    /// Size of the buffer used for the single read on each connection.
    pub read_buffer_size: usize,

    /// Optional cap on in-flight connection handlers. `None` means uncapped.
    pub max_connections: Option<usize>,
}

impl ServerConfig {
    /// Settings for the given host and port, defaults for everything else.
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: "8080".to_string(),
            read_buffer_size: 1024,
            max_connections: None,
        }
    }
}
