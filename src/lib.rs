//! EEG Cursor Agent - band-power estimation driving discrete cursor commands.
//!
//! Raw EEG samples are buffered per channel, transformed into the power of
//! the five classic frequency bands, smoothed over time and compared against
//! thresholds. Crossing a threshold issues a directional command to an
//! actuation sink.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         EEG Cursor Agent                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐             │
//! │  │ Acquisition │──▶│   Sample    │──▶│  Spectral   │             │
//! │  │    Feed     │   │   Buffer    │   │  Analyzer   │             │
//! │  └─────────────┘   └─────────────┘   └─────────────┘             │
//! │     every 10ms           │            every 1000ms│              │
//! │                          ▼                        ▼              │
//! │                   ┌─────────────┐   ┌─────────────┐             │
//! │                   │  Pipeline   │   │    Band     │             │
//! │                   │    View     │   │  Smoother   │             │
//! │                   └─────────────┘   └─────────────┘             │
//! │                                           │                      │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐             │
//! │  │  Indicator  │◀──│  Actuation  │◀──│   Trigger   │             │
//! │  │    Panel    │   │    Sink     │   │   Policy    │             │
//! │  └─────────────┘   └─────────────┘   └─────────────┘             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use eeg_cursor_agent::{
//!     acquisition::{SyntheticConfig, SyntheticFeed, Tone},
//!     actuation::VirtualCursor,
//!     config::Config,
//!     pipeline::Pipeline,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let feed = SyntheticFeed::new(
//!     SyntheticConfig::new(config.sampling_rate_hz, 1, config.ingest_interval)
//!         .with_tone(Tone::new(20.0, 200.0)),
//! )?;
//!
//! let handle = Pipeline::new(&config)?.spawn(feed, Arc::new(VirtualCursor::new((0, 0), 50)));
//! tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//! let report = handle.shutdown().await;
//! println!("{} triggers", report.trigger_count());
//! # Ok(())
//! # }
//! ```

pub mod acquisition;
pub mod actuation;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod stats;

// Re-export key types at crate root for convenience
pub use acquisition::{AcquisitionFeed, ManualFeed, ReplayFeed, SyntheticFeed};
pub use actuation::{ActuationSink, IndicatorPanel, LogSink, VirtualCursor};
pub use config::{Config, ConfigError};
pub use core::{Band, BandPowers, Command, TriggerEvent, TriggerRule};
pub use error::{PipelineError, Result};
pub use pipeline::{AnalysisReport, Pipeline, PipelineHandle, PipelineView, SessionReport};
pub use stats::{PipelineStats, StatsSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Band boundaries that can be displayed to users.
pub fn band_table() -> String {
    let mut table = String::from("Band     Range (Hz)\n");
    for band in Band::ALL {
        let (low, high) = band.range();
        table.push_str(&format!("{:<8} [{low}, {high})\n", band.name()));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_table_contents() {
        let table = band_table();
        assert!(table.contains("Delta"));
        assert!(table.contains("[35, 50)"));
        assert_eq!(table.lines().count(), 6);
    }
}
