use super::retention::RetentionPruner;
use crate::core::{
    Clock, CurrencyRateSource, FetchError, FetchLogEntry, MetalKind, MetalQuoteSource,
};
use crate::repository::{BatchUpdateReport, RateRepository};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Phases of one sync cycle, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    FetchingMetals,
    FetchingCurrencies,
    Reconciling,
    Logging,
    Pruning,
}

/// Why a step of the cycle left its record set unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Provider returned non-positive price {0}")]
    NonPositive(f64),
    #[error("Store error: {0}")]
    Store(String),
}

impl StepError {
    fn store(err: anyhow::Error) -> Self {
        StepError::Store(format!("{err:#}"))
    }
}

/// What one cycle did, step by step.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub fetched_at: DateTime<Utc>,
    pub gold: Result<f64, StepError>,
    pub silver: Result<f64, StepError>,
    pub currencies: Result<BatchUpdateReport, StepError>,
    /// Value written to the fetch log.
    pub success: bool,
    /// Whether the fetch log entry made it into the store.
    pub logged: bool,
    pub pruned: usize,
}

impl CycleOutcome {
    pub fn metal(&self, kind: MetalKind) -> &Result<f64, StepError> {
        match kind {
            MetalKind::Gold => &self.gold,
            MetalKind::Silver => &self.silver,
        }
    }
}

/// Runs sync cycles against one store and one pair of providers.
///
/// Built once at startup; the scheduler and the CLI share it through an `Arc`.
pub struct SyncService {
    repository: Arc<RateRepository>,
    pub(super) metals: Arc<dyn MetalQuoteSource>,
    pub(super) currencies: Arc<dyn CurrencyRateSource>,
    pub(super) clock: Arc<dyn Clock>,
    pruner: RetentionPruner,
    pub(super) run_lock: Mutex<()>,
}

impl SyncService {
    pub fn new(
        repository: Arc<RateRepository>,
        metals: Arc<dyn MetalQuoteSource>,
        currencies: Arc<dyn CurrencyRateSource>,
        clock: Arc<dyn Clock>,
        pruner: RetentionPruner,
    ) -> Self {
        Self {
            repository,
            metals,
            currencies,
            clock,
            pruner,
            run_lock: Mutex::new(()),
        }
    }

    pub fn repository(&self) -> &Arc<RateRepository> {
        &self.repository
    }

    fn enter(&self, state: CycleState) {
        debug!(?state, "Sync cycle state");
    }

    /// Runs one full cycle. Failures are folded into the outcome, never returned.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let _guard = self.run_lock.lock().await;
        let now = self.clock.now();
        info!(fetched_at = %now.to_rfc3339(), "Starting sync cycle");

        // Each request keeps its own deadline and none cancels the others.
        let (gold, silver, table) = tokio::join!(
            self.fetch_metal(MetalKind::Gold),
            self.fetch_metal(MetalKind::Silver),
            self.fetch_currency_table(),
        );

        self.enter(CycleState::Reconciling);
        let gold = self.reconcile_metal(MetalKind::Gold, gold, now).await;
        let silver = self.reconcile_metal(MetalKind::Silver, silver, now).await;
        let currencies = self.reconcile_currencies(table).await;
        let success = gold.is_ok() && silver.is_ok() && currencies.is_ok();

        self.enter(CycleState::Logging);
        let entry = FetchLogEntry {
            fetched_at: now,
            metals_source: self.metals.source_name().to_string(),
            currency_source: self.currencies.source_name().to_string(),
            success,
        };
        let logged = match self.repository.append_log(&entry).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to write fetch log entry");
                false
            }
        };

        self.enter(CycleState::Pruning);
        let pruned = match self
            .pruner
            .prune(&self.repository, self.pruner.cutoff(now))
            .await
        {
            Ok(count) => count,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to prune fetch log");
                0
            }
        };

        if let Err(e) = self.repository.persist() {
            warn!(error = %format!("{e:#}"), "Failed to flush store");
        }
        self.enter(CycleState::Idle);

        let outcome = CycleOutcome {
            fetched_at: now,
            gold,
            silver,
            currencies,
            success,
            logged,
            pruned,
        };
        if outcome.success {
            info!(pruned, "Sync cycle completed");
        } else {
            warn!(
                gold = ?outcome.gold,
                silver = ?outcome.silver,
                currencies = ?outcome.currencies,
                "Sync cycle completed with failures"
            );
        }
        outcome
    }

    async fn fetch_metal(&self, kind: MetalKind) -> Result<f64, FetchError> {
        self.enter(CycleState::FetchingMetals);
        self.metals.fetch_ask(kind).await
    }

    async fn fetch_currency_table(&self) -> Result<BTreeMap<String, f64>, FetchError> {
        self.enter(CycleState::FetchingCurrencies);
        self.currencies.fetch_rates().await
    }

    async fn reconcile_metal(
        &self,
        kind: MetalKind,
        fetched: Result<f64, FetchError>,
        now: DateTime<Utc>,
    ) -> Result<f64, StepError> {
        let ask = match fetched {
            Ok(ask) if ask > 0.0 => ask,
            Ok(ask) => {
                warn!(
                    metal = %kind,
                    ask,
                    "Keeping stored price, provider returned non-positive ask"
                );
                return Err(StepError::NonPositive(ask));
            }
            Err(e) => {
                warn!(metal = %kind, error = %e, "Keeping stored price, fetch failed");
                return Err(e.into());
            }
        };

        self.repository
            .upsert_metal(kind.name(), ask, now)
            .await
            .map_err(StepError::store)?;
        info!(metal = %kind, price = ask, "Updated metal price");
        Ok(ask)
    }

    async fn reconcile_currencies(
        &self,
        fetched: Result<BTreeMap<String, f64>, FetchError>,
    ) -> Result<BatchUpdateReport, StepError> {
        let rates = fetched.map_err(|e| {
            warn!(error = %e, "Keeping stored currency rates, fetch failed");
            StepError::from(e)
        })?;

        let updates: Vec<(String, f64)> = rates.into_iter().collect();
        let report = self
            .repository
            .batch_update_rates(&updates)
            .await
            .map_err(StepError::store)?;
        info!(
            updated = report.updated,
            skipped = report.skipped,
            rejected = report.rejected,
            "Updated currency rates"
        );
        Ok(report)
    }
}
