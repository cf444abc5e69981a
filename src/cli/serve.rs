use crate::core::config::ScheduleConfig;
use crate::sync::{Scheduler, SyncService};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Runs the daily scheduler until Ctrl-C.
pub async fn run(
    service: Arc<SyncService>,
    schedule: ScheduleConfig,
    refresh_on_start: bool,
) -> Result<()> {
    let scheduler = Scheduler::new(service, schedule)?;
    info!(
        "Syncing daily at {} UTC, press Ctrl-C to stop",
        scheduler.fire_at().format("%H:%M")
    );
    let (handle, worker) = scheduler.spawn();

    if refresh_on_start {
        let ack = handle.refresh_now();
        info!(scheduled = ack.scheduled, "Requested startup refresh");
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutting down, waiting for any running cycle to finish");

    drop(handle);
    worker.await.context("Scheduler worker panicked")?;
    Ok(())
}
