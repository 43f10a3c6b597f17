//! Connection metrics.
//!
//! # Metrics
//! - `server_connections_accepted_total` (counter)
//! - `server_connections_closed_total` (counter)
//! - `server_connection_errors_total` (counter): labelled by `stage` (read, write, close)
//! - `server_active_connections` (gauge)

use metrics::{counter, gauge};

pub fn record_accepted() {
    counter!("server_connections_accepted_total").increment(1);
    gauge!("server_active_connections").increment(1.0);
}

pub fn record_closed() {
    counter!("server_connections_closed_total").increment(1);
    gauge!("server_active_connections").decrement(1.0);
}

/// Record a contained per-connection I/O failure.
pub fn record_connection_error(stage: &'static str) {
    counter!("server_connection_errors_total", "stage" => stage).increment(1);
}
