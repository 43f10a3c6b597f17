//! OS signal handling.

/// Wait for Ctrl+C (SIGINT).
///
/// If the handler cannot be installed the error is logged and this future
/// never resolves, so the process keeps serving until killed.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
