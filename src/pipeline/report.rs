//! Per-cycle analysis reports and the end-of-session report.
//!
//! Analysis reports are transient: the live runtime publishes the latest
//! one and the session only keeps running per-band aggregates.

use crate::core::{Band, BandPowers, Command, TriggerEvent};
use crate::stats::StatsSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The name of this producer.
pub const PRODUCER_NAME: &str = "eeg-cursor-agent";

/// Outcome of one completed analysis cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Analysis cycle, starting at 1
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
    /// Channel that was analyzed
    pub channel: usize,
    /// Samples in the analyzed window
    pub window_len: usize,
    /// Band powers of this window alone
    pub raw: BandPowers,
    /// Smoothed band powers after this cycle
    pub smoothed: BandPowers,
    /// Commands raised this cycle, in rule order
    pub events: Vec<TriggerEvent>,
}

/// Running statistics of one band's smoothed power.
///
/// Welford's update, so the session never holds per-cycle values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BandAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
    max: f64,
    triggers: usize,
}

impl BandAccumulator {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        if self.count == 1 || value > self.max {
            self.max = value;
        }
    }

    fn std_dev(&self) -> f64 {
        if self.count > 1 {
            (self.m2 / (self.count - 1) as f64).sqrt()
        } else {
            0.0
        }
    }
}

/// Aggregates of every analysis cycle in a session.
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    cycles: u64,
    bands: [BandAccumulator; 5],
    commands: [u64; 4],
}

impl SessionSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one completed cycle into the aggregates.
    pub fn record(&mut self, report: &AnalysisReport) {
        self.cycles += 1;
        for (acc, band) in self.bands.iter_mut().zip(Band::ALL) {
            acc.add(report.smoothed.get(band));
        }
        for event in &report.events {
            self.bands[event.band.index()].triggers += 1;
            self.commands[event.command.index()] += 1;
        }
    }

    /// Completed analysis cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Trigger events across all bands.
    pub fn trigger_count(&self) -> usize {
        self.bands.iter().map(|b| b.triggers).sum()
    }

    pub fn band_summaries(&self) -> Vec<BandSummary> {
        Band::ALL
            .into_iter()
            .zip(self.bands.iter())
            .map(|(band, acc)| BandSummary {
                band,
                mean: acc.mean,
                std_dev: acc.std_dev(),
                max: acc.max,
                triggers: acc.triggers,
            })
            .collect()
    }

    pub fn command_counts(&self) -> Vec<CommandCount> {
        Command::ALL
            .into_iter()
            .map(|command| CommandCount {
                command,
                count: self.commands[command.index()],
            })
            .collect()
    }
}

/// Summary statistics of one band's smoothed power over a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSummary {
    pub band: Band,
    pub mean: f64,
    /// Sample standard deviation, 0 with fewer than two cycles
    pub std_dev: f64,
    pub max: f64,
    /// Trigger events raised on this band
    pub triggers: usize,
}

/// How often one command was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandCount {
    pub command: Command,
    pub count: u64,
}

/// Aggregate record of one pipeline session.
///
/// Carries no band power estimates or trigger events, only their totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: String,
    pub producer: String,
    pub producer_version: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub sampling_rate_hz: f64,
    pub analysis_channel: usize,
    /// Completed analysis cycles
    pub cycles: u64,
    /// One entry per band, in band order
    pub bands: Vec<BandSummary>,
    /// One entry per command, in command order
    pub commands: Vec<CommandCount>,
    pub stats: StatsSnapshot,
}

impl SessionReport {
    pub fn new(
        session_id: Uuid,
        started_at: DateTime<Utc>,
        sampling_rate_hz: f64,
        analysis_channel: usize,
        stats: StatsSnapshot,
        summary: &SessionSummary,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            producer: PRODUCER_NAME.to_string(),
            producer_version: crate::VERSION.to_string(),
            started_at,
            ended_at: Utc::now(),
            sampling_rate_hz,
            analysis_channel,
            cycles: summary.cycles(),
            bands: summary.band_summaries(),
            commands: summary.command_counts(),
            stats,
        }
    }

    /// Total trigger events over the session.
    pub fn trigger_count(&self) -> usize {
        self.bands.iter().map(|b| b.triggers).sum()
    }

    pub fn band(&self, band: Band) -> Option<&BandSummary> {
        self.bands.iter().find(|b| b.band == band)
    }

    pub fn command_count(&self, command: Command) -> u64 {
        self.commands
            .iter()
            .find(|c| c.command == command)
            .map_or(0, |c| c.count)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report as `session_<timestamp>.json` under `dir`.
    pub fn export(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "session_{}.json",
            self.ended_at.format("%Y%m%d_%H%M%S")
        ));
        std::fs::write(&path, self.to_json()?)?;
        Ok(path)
    }
}
