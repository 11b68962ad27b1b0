//! Session statistics for the EEG cursor agent.
//!
//! Counters are shared between the ingestion task, the analysis task and
//! the actuation tasks, and are surfaced in the session report.

pub mod counters;

// Re-export commonly used types
pub use counters::{create_shared_stats, PipelineStats, SharedStats, StatsSnapshot};
