//! hello-listener
//!
//! Binds 127.0.0.1:8080 and answers every connection with a fixed
//! `Hello, World!` reply.
//!
//! ```text
//!     Client ──TCP──▶ ┌──────────┐  spawn  ┌────────────────────┐
//!                     │  accept  │────────▶│ connection handler │──▶ fixed reply, close
//!                     │   loop   │         └────────────────────┘
//!                     └────▲─────┘
//!     Ctrl+C ─────────────┘ shutdown() closes the listener
//! ```

use std::sync::Arc;

use hello_listener::lifecycle::shutdown_signal;
use hello_listener::observability::logging::init_logging;
use hello_listener::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    tracing::info!("hello-listener v{} starting", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::default();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        read_buffer_size = config.read_buffer_size,
        "Configuration loaded"
    );

    let server = Arc::new(Server::with_config(config)?);

    let signal_server = Arc::clone(&server);
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_server.shutdown().await;
    });

    match server.start().await {
        Err(e) if e.is_listener_closed() => {
            tracing::info!("Shutdown complete");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Could not start server");
            Err(e.into())
        }
        Ok(never) => match never {},
    }
}
