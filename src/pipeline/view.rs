//! Read-only access to a running pipeline for displays.

use crate::actuation::IndicatorPanel;
use crate::core::{BandPowers, ChannelSnapshot, Command};
use crate::error::Result;
use crate::pipeline::{AnalysisReport, SharedBuffer};
use crate::stats::{SharedStats, StatsSnapshot};
use tokio::sync::watch;

/// Observes buffer contents, reports, indicators and counters.
///
/// Nothing reachable from a view can change pipeline state.
#[derive(Debug, Clone)]
pub struct PipelineView {
    buffer: SharedBuffer,
    latest: watch::Receiver<Option<AnalysisReport>>,
    panel: IndicatorPanel,
    stats: SharedStats,
}

impl PipelineView {
    pub(crate) fn new(
        buffer: SharedBuffer,
        latest: watch::Receiver<Option<AnalysisReport>>,
        panel: IndicatorPanel,
        stats: SharedStats,
    ) -> Self {
        Self {
            buffer,
            latest,
            panel,
            stats,
        }
    }

    /// Copy of everything currently buffered on a channel.
    pub async fn raw_samples(&self, channel: usize) -> Result<ChannelSnapshot> {
        self.buffer.read().await.contents(channel)
    }

    /// The most recent completed analysis cycle.
    pub fn latest_report(&self) -> Option<AnalysisReport> {
        self.latest.borrow().clone()
    }

    /// Smoothed band powers, zero before the first cycle.
    pub fn smoothed(&self) -> BandPowers {
        self.latest
            .borrow()
            .as_ref()
            .map(|report| report.smoothed)
            .unwrap_or_default()
    }

    /// Wait for the next completed cycle.
    ///
    /// Returns `None` once the pipeline has stopped.
    pub async fn next_report(&mut self) -> Option<AnalysisReport> {
        self.latest.changed().await.ok()?;
        self.latest.borrow_and_update().clone()
    }

    pub fn is_lit(&self, command: Command) -> bool {
        self.panel.is_lit(command)
    }

    pub fn panel(&self) -> &IndicatorPanel {
        &self.panel
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.stats()
    }
}
