pub mod cli;
pub mod core;
pub mod providers;
pub mod repository;
pub mod store;
pub mod sync;

use crate::core::config::AppConfig;
use crate::core::{Store, SystemClock};
use crate::providers::{FxRatesProvider, SwissquoteProvider};
use crate::repository::RateRepository;
use crate::store::KeyValueStore;
use crate::sync::{RetentionPruner, SyncService};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Seed,
    Sync,
    Serve { refresh_on_start: bool },
    Snapshot { json: bool },
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

/// Opens the on-disk store at the configured data path, or a throwaway one.
pub fn open_store(config: &AppConfig, in_memory: bool) -> Result<Arc<dyn Store>> {
    if in_memory {
        info!("Using in-memory store, nothing will be kept after exit");
        return Ok(Arc::new(KeyValueStore::in_memory()));
    }
    let path = config.default_data_path()?;
    debug!("Opening store at {}", path.display());
    Ok(Arc::new(KeyValueStore::open(&path)?))
}

/// Wires both providers, the repository and the pruner into one service.
pub fn build_service(config: &AppConfig, store: Arc<dyn Store>) -> Result<Arc<SyncService>> {
    let swissquote = &config.providers.swissquote;
    let fxrates = &config.providers.fxrates;

    let metals = SwissquoteProvider::new(&swissquote.base_url, swissquote.timeout())?;
    let currencies =
        FxRatesProvider::new(&fxrates.base_url, fxrates.api_key.clone(), fxrates.timeout())?;

    Ok(Arc::new(SyncService::new(
        Arc::new(RateRepository::new(store)?),
        Arc::new(metals),
        Arc::new(currencies),
        Arc::new(SystemClock),
        RetentionPruner::days(config.retention_days),
    )))
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    in_memory: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let service = build_service(&config, open_store(&config, in_memory)?)?;

    match command {
        AppCommand::Seed => cli::sync::seed(&service).await,
        AppCommand::Sync => cli::sync::run(&service).await,
        AppCommand::Serve { refresh_on_start } => {
            cli::serve::run(service, config.schedule, refresh_on_start).await
        }
        AppCommand::Snapshot { json } => cli::snapshot::run(service.repository(), json).await,
    }
}
