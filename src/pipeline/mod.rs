//! Wiring of acquisition, analysis and actuation.
//!
//! This module contains:
//! - The analysis stage (spectrum, smoothing, triggers)
//! - The pipeline object and its tokio runtime
//! - A read-only view for displays
//! - Analysis and session reports
//! - Offline replay of recordings

pub mod offline;
pub mod report;
pub mod runtime;
pub mod stage;
pub mod view;

// Re-export commonly used types
pub use offline::{analyze_recording, analyze_recording_with};
pub use report::{
    AnalysisReport, BandSummary, CommandCount, SessionReport, SessionSummary, PRODUCER_NAME,
};
pub use runtime::{Pipeline, PipelineHandle, SharedBuffer, RECENT_REPORTS};
pub use stage::AnalysisStage;
pub use view::PipelineView;
