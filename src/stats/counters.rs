//! Lock-free pipeline counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running counters for one pipeline instance.
#[derive(Debug)]
pub struct PipelineStats {
    /// Samples pushed into the buffer, all channels
    samples_ingested: AtomicU64,
    /// Ingestion cycles skipped because the feed failed
    ingest_cycles_skipped: AtomicU64,
    /// Analysis cycles that produced a report
    analysis_cycles: AtomicU64,
    /// Analysis cycles skipped for lack of data
    analysis_cycles_skipped: AtomicU64,
    /// Trigger events raised by the policy
    triggers_fired: AtomicU64,
    /// Commands the sink performed
    actuations: AtomicU64,
    /// Commands the sink rejected
    actuation_failures: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self {
            samples_ingested: AtomicU64::new(0),
            ingest_cycles_skipped: AtomicU64::new(0),
            analysis_cycles: AtomicU64::new(0),
            analysis_cycles_skipped: AtomicU64::new(0),
            triggers_fired: AtomicU64::new(0),
            actuations: AtomicU64::new(0),
            actuation_failures: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn record_samples(&self, count: u64) {
        self.samples_ingested.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_ingest_skipped(&self) {
        self.ingest_cycles_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_analysis_cycle(&self) {
        self.analysis_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_analysis_skipped(&self) {
        self.analysis_cycles_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_triggers(&self, count: u64) {
        self.triggers_fired.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_actuation(&self) {
        self.actuations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_actuation_failure(&self) {
        self.actuation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            ingest_cycles_skipped: self.ingest_cycles_skipped.load(Ordering::Relaxed),
            analysis_cycles: self.analysis_cycles.load(Ordering::Relaxed),
            analysis_cycles_skipped: self.analysis_cycles_skipped.load(Ordering::Relaxed),
            triggers_fired: self.triggers_fired.load(Ordering::Relaxed),
            actuations: self.actuations.load(Ordering::Relaxed),
            actuation_failures: self.actuation_failures.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Samples ingested: {}\n\
             - Ingestion cycles skipped: {}\n\
             - Analysis cycles: {} ({} skipped)\n\
             - Triggers fired: {}\n\
             - Actuations: {} ({} failed)\n\
             - Session duration: {} seconds",
            stats.samples_ingested,
            stats.ingest_cycles_skipped,
            stats.analysis_cycles,
            stats.analysis_cycles_skipped,
            stats.triggers_fired,
            stats.actuations,
            stats.actuation_failures,
            stats.session_duration_secs
        )
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of pipeline statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub samples_ingested: u64,
    pub ingest_cycles_skipped: u64,
    pub analysis_cycles: u64,
    pub analysis_cycles_skipped: u64,
    pub triggers_fired: u64,
    pub actuations: u64,
    pub actuation_failures: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared statistics.
pub type SharedStats = Arc<PipelineStats>;

pub fn create_shared_stats() -> SharedStats {
    Arc::new(PipelineStats::new())
}
