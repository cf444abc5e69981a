use super::orchestrator::SyncService;
use crate::core::config::ScheduleConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Acknowledgement of a manual refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshAck {
    pub scheduled: bool,
}

#[derive(Debug)]
enum Trigger {
    Manual,
}

/// Next instant strictly after `now` whose UTC wall time is `at`.
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Runs one sync cycle per day at a fixed UTC time, plus any manual refreshes.
pub struct Scheduler {
    service: Arc<SyncService>,
    fire_at: NaiveTime,
}

impl Scheduler {
    pub fn new(service: Arc<SyncService>, schedule: ScheduleConfig) -> Result<Self> {
        let fire_at = NaiveTime::from_hms_opt(schedule.hour_utc, schedule.minute_utc, 0)
            .with_context(|| {
                format!(
                    "Invalid schedule time {:02}:{:02} UTC",
                    schedule.hour_utc, schedule.minute_utc
                )
            })?;
        Ok(Self { service, fire_at })
    }

    pub fn fire_at(&self) -> NaiveTime {
        self.fire_at
    }

    /// Starts the single worker. It stops once every handle has been dropped.
    pub fn spawn(self) -> (SchedulerHandle, JoinHandle<()>) {
        let (tx, rx) = unbounded_channel();
        let worker = tokio::spawn(run_worker(self.service, self.fire_at, rx));
        (SchedulerHandle { tx }, worker)
    }
}

/// Cheap to clone. Every clone feeds the same worker.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: UnboundedSender<Trigger>,
}

impl SchedulerHandle {
    /// Queues a cycle and returns without waiting for it.
    pub fn refresh_now(&self) -> RefreshAck {
        let scheduled = self.tx.send(Trigger::Manual).is_ok();
        if scheduled {
            debug!("Manual refresh queued");
        } else {
            debug!("Manual refresh dropped, scheduler worker has stopped");
        }
        RefreshAck { scheduled }
    }
}

async fn run_worker(
    service: Arc<SyncService>,
    fire_at: NaiveTime,
    mut rx: UnboundedReceiver<Trigger>,
) {
    info!(fire_at = %fire_at, "Scheduler started");
    loop {
        let now = service.clock.now();
        let next = next_run_after(now, fire_at);
        let wait = (next - now).to_std().unwrap_or_default();
        debug!(next_run = %next.to_rfc3339(), "Waiting for next scheduled cycle");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                info!("Running scheduled sync cycle");
                service.run_cycle().await;
            }
            trigger = rx.recv() => match trigger {
                Some(Trigger::Manual) => {
                    info!("Running manual sync cycle");
                    service.run_cycle().await;
                }
                None => break,
            }
        }
    }
    info!("Scheduler stopped");
}
