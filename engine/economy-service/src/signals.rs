//! Signal handling for graceful shutdown

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::service::ServiceState;

/// Listen for Ctrl+C and SIGTERM. The receiver yields once either arrives.
pub fn setup_signal_handlers() -> Result<mpsc::Receiver<()>> {
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C signal: {}", e);
            return;
        }

        info!("Ctrl+C signal received");
        let _ = ctrl_c_tx.send(()).await;
    });

    #[cfg(unix)]
    {
        use signal_hook::consts::SIGTERM;

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(SIGTERM, shutdown_flag.clone())?;

        tokio::spawn(async move {
            while !shutdown_flag.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            info!("SIGTERM signal received");
            let _ = shutdown_tx.send(()).await;
        });
    }

    Ok(shutdown_rx)
}

/// Stop the scheduler and wait for its task, bounded by the shutdown timeout
pub async fn graceful_shutdown(
    service_state: Arc<ServiceState>,
    scheduler_handle: tokio::task::JoinHandle<()>,
) -> Result<()> {
    info!("Starting graceful shutdown...");

    service_state.stop_scheduler();

    let shutdown_timeout = Duration::from_secs(service_state.config.service.shutdown_timeout_secs);
    match timeout(shutdown_timeout, scheduler_handle).await {
        Ok(Ok(())) => info!("AutoLockScheduler stopped gracefully"),
        Ok(Err(e)) => error!("AutoLockScheduler task failed: {}", e),
        Err(_) => warn!("AutoLockScheduler did not stop within timeout, forcing shutdown"),
    }

    if let Err(e) = service_state.shutdown().await {
        error!("Failed to shutdown service components: {}", e);
    }

    info!("Graceful shutdown complete");
    Ok(())
}
