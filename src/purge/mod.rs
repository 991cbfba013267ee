//! The purge pipeline: per-target search/delete loop and the run around it.

pub mod coordinator;
pub mod orchestrator;
pub mod settings;
pub mod stats;
pub mod target;

pub use coordinator::Purger;
pub use orchestrator::{TargetOutcome, TargetPurge};
pub use settings::PurgeSettings;
pub use stats::PurgeStats;
pub use target::Target;
