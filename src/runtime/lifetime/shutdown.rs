use std::time::Duration;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 等待后台任务退出的超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Resolves once Ctrl+C arrives (or listening for it fails).
pub async fn wait_for_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping background tasks...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}

/// Cancels the sweeper and waits (bounded) for its current iteration to end.
pub async fn stop_sweeper(token: CancellationToken, sweeper: JoinHandle<()>) {
    token.cancel();

    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), sweeper).await {
        Ok(Ok(())) => info!("Sweeper stopped cleanly"),
        Ok(Err(e)) => error!("Sweeper task failed: {}", e),
        Err(_) => error!(
            "Sweeper did not stop within {} seconds, abandoning it",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}
