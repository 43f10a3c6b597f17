//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML text (optional, library users only)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//! ```
//!
//! The `hello-listener` binary never reads a file; it runs on
//! `ServerConfig::default()`.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ServerConfig;
pub use validation::{validate_config, ValidationError};
