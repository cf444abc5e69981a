pub mod serve;
pub mod setup;
pub mod snapshot;
pub mod sync;
pub mod ui;
