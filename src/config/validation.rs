//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. Every problem is
//! reported, not just the first one.

use std::fmt;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a [`ServerConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Host is whitespace. An empty host is allowed and means every interface.
    BlankHost,
    InvalidPort(String),
    ZeroReadBuffer,
    ZeroMaxConnections,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::BlankHost => write!(f, "host must not be blank"),
            ValidationError::InvalidPort(port) => write!(f, "invalid port: {:?}", port),
            ValidationError::ZeroReadBuffer => write!(f, "read_buffer_size must be greater than 0"),
            ValidationError::ZeroMaxConnections => {
                write!(f, "max_connections must be greater than 0 when set")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a configuration, collecting every error found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.host.is_empty() && config.host.trim().is_empty() {
        errors.push(ValidationError::BlankHost);
    }
    if config.port.parse::<u16>().is_err() {
        errors.push(ValidationError::InvalidPort(config.port.clone()));
    }
    if config.read_buffer_size == 0 {
        errors.push(ValidationError::ZeroReadBuffer);
    }
    if config.max_connections == Some(0) {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
