//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! net subsystem produces:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (connection counters and gauges)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`address = %addr`) rather than formatted strings
//! - Metrics are recorded through the `metrics` facade; installing an
//!   exporter is left to the embedding application

pub mod logging;
pub mod metrics;
