//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Init logging → Build server → start() (bind, then accept loop)
//!
//! Shutdown (signals.rs):
//!     SIGINT/Ctrl+C → Server::shutdown → accept loop ends with ListenerClosed → Exit 0
//! ```
//!
//! # Design Decisions
//! - Bind failure is fatal: the process exits non-zero
//! - Shutdown stops accepting; in-flight connections are not awaited

pub mod signals;

pub use signals::shutdown_signal;
