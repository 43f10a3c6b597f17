//! Minimal TCP server that answers every connection with a fixed
//! `Hello, World!` HTTP reply.

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServerConfig;
pub use net::{Server, ServerError, ServerState, RESPONSE};
