//! The sync pipeline: one cycle fetches both providers, reconciles the store,
//! appends to the fetch log and prunes it. The scheduler drives cycles daily and
//! on demand.

pub mod orchestrator;
pub mod retention;
pub mod scheduler;
pub mod seed;

pub use orchestrator::{CycleOutcome, CycleState, StepError, SyncService};
pub use retention::RetentionPruner;
pub use scheduler::{RefreshAck, Scheduler, SchedulerHandle, next_run_after};
pub use seed::{CURRENCY_CATALOG, SeedReport};
