//! Core domain types and the seams between the sync pipeline and the outside world

pub mod clock;
pub mod config;
pub mod error;
pub mod log;
pub mod model;
pub mod source;
pub mod store;

// Re-export main types for cleaner imports
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::FetchError;
pub use model::{Currency, FetchLogEntry, Metal, MetalKind, MetalPrice, Snapshot};
pub use source::{CurrencyRateSource, MetalQuoteSource};
pub use store::{KeyValueCollection, Store};
