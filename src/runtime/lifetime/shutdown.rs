use tokio::signal;
use tracing::{info, warn};

/// Resolves once the process receives Ctrl+C.
///
/// Raced against the server future in a select; clicks and conversions are
/// written synchronously, so there is nothing to flush before exit.
pub async fn listen_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping server...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}
