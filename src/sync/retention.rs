use crate::repository::RateRepository;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Keeps the fetch log bounded to a rolling horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPruner {
    horizon: Duration,
}

impl RetentionPruner {
    pub fn new(horizon: Duration) -> Self {
        Self { horizon }
    }

    pub fn days(days: u32) -> Self {
        Self::new(Duration::days(i64::from(days)))
    }

    /// Start of the horizon. A horizon reaching past the earliest representable
    /// instant keeps every entry.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.horizon).unwrap_or_else(|| {
            warn!(
                horizon_days = self.horizon.num_days(),
                "Retention horizon is out of range, keeping all fetch log entries"
            );
            DateTime::<Utc>::MIN_UTC
        })
    }

    /// Deletes entries strictly older than `cutoff`.
    pub async fn prune(
        &self,
        repository: &RateRepository,
        cutoff: DateTime<Utc>,
    ) -> Result<usize> {
        let deleted = repository.prune_log_before(cutoff).await?;
        if deleted > 0 {
            info!(deleted, cutoff = %cutoff.to_rfc3339(), "Pruned old fetch log entries");
        } else {
            debug!(cutoff = %cutoff.to_rfc3339(), "No fetch log entries to prune");
        }
        Ok(deleted)
    }
}

impl Default for RetentionPruner {
    fn default() -> Self {
        Self::days(DEFAULT_RETENTION_DAYS)
    }
}
