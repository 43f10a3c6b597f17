//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Server::start
//!     → listener.rs (resolve host:port, bind, signal readiness, accept loop)
//!     → connection.rs (one task per connection: single read, fixed reply, close)
//!
//! Server states:
//!     Unbound → Listening → Closed
//!     Unbound → Closed          (shutdown or failed bind before listening)
//! ```
//!
//! # Design Decisions
//! - The listener slot lives behind a mutex; binding and shutdown both hold it
//! - Readiness and closure are published on one watch channel
//! - Handlers are unsupervised; shutdown only stops new accepts
//! - Concurrency is uncapped unless `max_connections` is configured

pub mod connection;
pub mod listener;

pub use connection::{handle_connection, ConnectionGuard, ConnectionId, RESPONSE};
pub use listener::{Server, ServerError, ServerState};
