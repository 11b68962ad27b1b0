//! Pipeline orchestration.
//!
//! A [`Pipeline`] can be driven one cycle at a time (`ingest_once`,
//! `analyze_once`) or handed to tokio with [`Pipeline::spawn`], which runs
//! the ingestion and analysis cycles as two independent interval tasks.

use crate::acquisition::AcquisitionFeed;
use crate::actuation::{ActuationSink, Actuator, IndicatorPanel};
use crate::config::{Config, ConfigError};
use crate::core::{BandPowers, SampleBuffer};
use crate::error::{PipelineError, Result};
use crate::pipeline::{AnalysisReport, AnalysisStage, PipelineView, SessionReport, SessionSummary};
use crate::stats::{create_shared_stats, SharedStats};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

/// Completed reports a [`Pipeline`] keeps for display.
pub const RECENT_REPORTS: usize = 32;

/// Sample buffer shared between the ingestion task, the analysis task and views.
pub type SharedBuffer = Arc<RwLock<SampleBuffer>>;

/// Read one cycle's worth of samples from every channel.
///
/// Fails as a whole if any channel fails, so a cycle is either ingested
/// completely or not at all.
fn read_cycle<F: AcquisitionFeed + ?Sized>(feed: &mut F, channels: usize) -> Result<Vec<Vec<f64>>> {
    (0..channels).map(|channel| feed.read(channel)).collect()
}

fn commit_cycle(buffer: &mut SampleBuffer, chunks: &[Vec<f64>]) -> Result<usize> {
    let mut pushed = 0;
    for (channel, chunk) in chunks.iter().enumerate() {
        buffer.extend(channel, chunk)?;
        pushed += chunk.len();
    }
    Ok(pushed)
}

fn invalid_config(err: ConfigError) -> PipelineError {
    match err {
        ConfigError::Invalid(msg) => PipelineError::InvalidConfig(msg),
        other => PipelineError::InvalidConfig(other.to_string()),
    }
}

/// One pipeline instance: buffer, analysis stage and session bookkeeping.
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    session_id: Uuid,
    started_at: DateTime<Utc>,
    buffer: SampleBuffer,
    stage: AnalysisStage,
    stats: SharedStats,
    panel: IndicatorPanel,
    recent: VecDeque<AnalysisReport>,
    summary: SessionSummary,
}

impl Pipeline {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate().map_err(invalid_config)?;

        Ok(Self {
            config: config.clone(),
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            buffer: SampleBuffer::new(
                config.channel_count,
                config.buffer_capacity,
                config.min_window,
            )?,
            stage: AnalysisStage::new(config)?,
            stats: create_shared_stats(),
            panel: IndicatorPanel::new(),
            recent: VecDeque::with_capacity(RECENT_REPORTS),
            summary: SessionSummary::new(),
        })
    }

    /// Run one ingestion cycle against `feed`.
    ///
    /// Returns the number of samples pushed. On a feed failure the cycle is
    /// counted as skipped and the buffer is left untouched.
    pub fn ingest_once<F: AcquisitionFeed + ?Sized>(&mut self, feed: &mut F) -> Result<usize> {
        let chunks = match read_cycle(feed, self.config.channel_count) {
            Ok(chunks) => chunks,
            Err(e) => {
                self.stats.record_ingest_skipped();
                tracing::warn!(error = %e, "ingestion cycle skipped");
                return Err(e);
            }
        };

        let pushed = commit_cycle(&mut self.buffer, &chunks)?;
        self.stats.record_samples(pushed as u64);
        Ok(pushed)
    }

    /// Append samples to one channel directly.
    pub fn push_samples(&mut self, channel: usize, samples: &[f64]) -> Result<()> {
        self.buffer.extend(channel, samples)?;
        self.stats.record_samples(samples.len() as u64);
        Ok(())
    }

    /// Run one analysis cycle.
    ///
    /// Trigger events are returned in the report, not actuated. A short
    /// buffer skips the cycle and leaves the smoothed state unchanged.
    pub fn analyze_once(&mut self) -> Result<AnalysisReport> {
        match self.stage.run(&self.buffer) {
            Ok(report) => {
                self.stats.record_analysis_cycle();
                self.stats.record_triggers(report.events.len() as u64);
                self.summary.record(&report);
                if self.recent.len() == RECENT_REPORTS {
                    self.recent.pop_front();
                }
                self.recent.push_back(report.clone());
                Ok(report)
            }
            Err(e) => {
                self.stats.record_analysis_skipped();
                tracing::debug!(error = %e, "analysis cycle skipped");
                Err(e)
            }
        }
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn smoothed(&self) -> BandPowers {
        self.stage.smoothed()
    }

    pub fn stats(&self) -> &SharedStats {
        &self.stats
    }

    /// The last [`RECENT_REPORTS`] completed cycles, oldest first.
    pub fn recent_reports(&self) -> &VecDeque<AnalysisReport> {
        &self.recent
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Report of everything analyzed so far.
    pub fn session_report(&self) -> SessionReport {
        SessionReport::new(
            self.session_id,
            self.started_at,
            self.config.sampling_rate_hz,
            self.stage.channel(),
            self.stats.stats(),
            &self.summary,
        )
    }

    /// Start the ingestion and analysis cycles on the current tokio runtime.
    ///
    /// Every trigger event is handed to `sink` in its own task.
    pub fn spawn<F>(self, feed: F, sink: Arc<dyn ActuationSink>) -> PipelineHandle
    where
        F: AcquisitionFeed + 'static,
    {
        let Pipeline {
            config,
            session_id,
            started_at,
            buffer,
            stage,
            stats,
            panel,
            recent,
            summary,
        } = self;

        let buffer: SharedBuffer = Arc::new(RwLock::new(buffer));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (latest_tx, latest_rx) = watch::channel(recent.back().cloned());

        let ingest = tokio::spawn(ingest_loop(
            feed,
            buffer.clone(),
            stats.clone(),
            config.channel_count,
            config.ingest_interval,
            shutdown_rx.clone(),
        ));

        let actuator = Actuator::new(sink, panel.clone(), stats.clone(), config.flash_duration);
        let analysis = tokio::spawn(analysis_loop(
            AnalysisTask {
                stage,
                actuator,
                summary,
                buffer: buffer.clone(),
                stats: stats.clone(),
                latest: latest_tx,
            },
            config.analysis_interval,
            shutdown_rx,
        ));

        tracing::info!(
            %session_id,
            channels = config.channel_count,
            sampling_rate_hz = config.sampling_rate_hz,
            "pipeline started"
        );

        PipelineHandle {
            view: PipelineView::new(buffer, latest_rx, panel, stats.clone()),
            stats,
            shutdown_tx,
            ingest,
            analysis,
            session_id,
            started_at,
            sampling_rate_hz: config.sampling_rate_hz,
            analysis_channel: config.analysis_channel,
            shutdown_grace: config.shutdown_grace,
        }
    }
}

async fn ingest_loop<F: AcquisitionFeed>(
    mut feed: F,
    buffer: SharedBuffer,
    stats: SharedStats,
    channels: usize,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let chunks = match read_cycle(&mut feed, channels) {
                    Ok(chunks) => chunks,
                    Err(e) => {
                        stats.record_ingest_skipped();
                        tracing::warn!(error = %e, "ingestion cycle skipped");
                        continue;
                    }
                };

                let mut guard = buffer.write().await;
                match commit_cycle(&mut guard, &chunks) {
                    Ok(pushed) => stats.record_samples(pushed as u64),
                    Err(e) => tracing::warn!(error = %e, "rejected samples"),
                }
            }
        }
    }

    tracing::debug!("ingestion task stopped");
}

/// State owned by the analysis task.
struct AnalysisTask {
    stage: AnalysisStage,
    actuator: Actuator,
    summary: SessionSummary,
    buffer: SharedBuffer,
    stats: SharedStats,
    latest: watch::Sender<Option<AnalysisReport>>,
}

impl AnalysisTask {
    async fn cycle(&mut self) {
        let snapshot = {
            let guard = self.buffer.read().await;
            guard.snapshot(self.stage.channel())
        };

        let report = match snapshot.and_then(|s| self.stage.analyze_snapshot(&s)) {
            Ok(report) => report,
            Err(e) => {
                self.stats.record_analysis_skipped();
                tracing::debug!(error = %e, "analysis cycle skipped");
                return;
            }
        };

        self.stats.record_analysis_cycle();
        self.stats.record_triggers(report.events.len() as u64);
        for event in &report.events {
            self.actuator.dispatch(event);
        }

        self.summary.record(&report);
        self.latest.send_replace(Some(report));
    }
}

async fn analysis_loop(
    mut task: AnalysisTask,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> (SessionSummary, Actuator) {
    // First cycle one full period after start.
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => task.cycle().await,
        }
    }

    tracing::debug!(cycles = task.stage.cycle(), "analysis task stopped");
    (task.summary, task.actuator)
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    view: PipelineView,
    stats: SharedStats,
    shutdown_tx: watch::Sender<bool>,
    ingest: JoinHandle<()>,
    analysis: JoinHandle<(SessionSummary, Actuator)>,
    session_id: Uuid,
    started_at: DateTime<Utc>,
    sampling_rate_hz: f64,
    analysis_channel: usize,
    shutdown_grace: Duration,
}

impl PipelineHandle {
    /// A read-only view of the running pipeline.
    pub fn view(&self) -> PipelineView {
        self.view.clone()
    }

    pub fn stats(&self) -> &SharedStats {
        &self.stats
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Stop both cycles, tear down in-flight actuations and report the session.
    pub async fn shutdown(self) -> SessionReport {
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.ingest.await {
            tracing::error!(error = %e, "ingestion task failed");
        }

        let summary = match self.analysis.await {
            Ok((summary, actuator)) => {
                let aborted = actuator.shutdown(self.shutdown_grace).await;
                if aborted > 0 {
                    tracing::warn!(aborted, "actuation tasks aborted at shutdown");
                }
                summary
            }
            Err(e) => {
                tracing::error!(error = %e, "analysis task failed");
                SessionSummary::new()
            }
        };

        tracing::info!(session_id = %self.session_id, cycles = summary.cycles(), "pipeline stopped");

        SessionReport::new(
            self.session_id,
            self.started_at,
            self.sampling_rate_hz,
            self.analysis_channel,
            self.stats.stats(),
            &summary,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::ManualFeed;

    fn small_config() -> Config {
        Config {
            buffer_capacity: 64,
            min_window: 64,
            channel_count: 2,
            ..Config::default()
        }
    }

    #[test]
    fn test_ingest_pushes_all_channels() {
        let mut pipeline = Pipeline::new(&small_config()).unwrap();
        let mut feed = ManualFeed::new(2, 250.0);
        feed.push_chunk(0, vec![1.0, 2.0, 3.0]);
        feed.push_chunk(1, vec![4.0, 5.0]);

        assert_eq!(pipeline.ingest_once(&mut feed).unwrap(), 5);
        assert_eq!(pipeline.buffer().len(0).unwrap(), 3);
        assert_eq!(pipeline.buffer().len(1).unwrap(), 2);
        assert_eq!(pipeline.stats().stats().samples_ingested, 5);
    }

    #[test]
    fn test_feed_failure_skips_whole_cycle() {
        let mut pipeline = Pipeline::new(&small_config()).unwrap();
        let mut feed = ManualFeed::new(2, 250.0);
        feed.push_chunk(0, vec![1.0; 10]);
        pipeline.ingest_once(&mut feed).unwrap();

        feed.push_chunk(0, vec![2.0; 10]);
        feed.set_available(false);
        assert!(matches!(
            pipeline.ingest_once(&mut feed),
            Err(PipelineError::FeedUnavailable(_))
        ));

        assert_eq!(pipeline.buffer().len(0).unwrap(), 10);
        let stats = pipeline.stats().stats();
        assert_eq!(stats.ingest_cycles_skipped, 1);
        assert_eq!(stats.samples_ingested, 10);
    }

    #[test]
    fn test_analysis_waits_for_full_window() {
        let mut pipeline = Pipeline::new(&small_config()).unwrap();
        pipeline.push_samples(0, &[1.0; 40]).unwrap();

        assert!(matches!(
            pipeline.analyze_once(),
            Err(PipelineError::InsufficientData {
                available: 40,
                required: 64
            })
        ));
        assert_eq!(pipeline.smoothed(), BandPowers::zero());
        assert!(pipeline.recent_reports().is_empty());

        pipeline.push_samples(0, &[1.0; 24]).unwrap();
        let report = pipeline.analyze_once().unwrap();
        assert_eq!(report.cycle, 1);
        assert_eq!(pipeline.recent_reports().len(), 1);
        assert_eq!(pipeline.summary().cycles(), 1);

        let stats = pipeline.stats().stats();
        assert_eq!(stats.analysis_cycles, 1);
        assert_eq!(stats.analysis_cycles_skipped, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config {
            smoothing_alpha: 0.0,
            ..Config::default()
        };
        assert!(matches!(
            Pipeline::new(&config),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_pipelines_are_independent() {
        let mut a = Pipeline::new(&small_config()).unwrap();
        let b = Pipeline::new(&small_config()).unwrap();
        a.push_samples(0, &[1.0; 64]).unwrap();
        a.analyze_once().unwrap();

        assert_ne!(a.session_id(), b.session_id());
        assert_eq!(b.buffer().len(0).unwrap(), 0);
        assert!(b.recent_reports().is_empty());
    }

    #[test]
    fn test_long_session_keeps_bounded_state() {
        let mut pipeline = Pipeline::new(&Config::default()).unwrap();
        for _ in 0..5000 {
            pipeline.push_samples(0, &[1.0; 250]).unwrap();
            let _ = pipeline.analyze_once();
        }

        // The first round is short of the 256-sample window
        assert_eq!(pipeline.summary().cycles(), 4999);
        assert_eq!(pipeline.recent_reports().len(), RECENT_REPORTS);
        assert_eq!(pipeline.recent_reports().back().unwrap().cycle, 4999);
        assert_eq!(
            pipeline.recent_reports().front().unwrap().cycle,
            4999 - RECENT_REPORTS as u64 + 1
        );

        let report = pipeline.session_report();
        assert_eq!(report.cycles, 4999);
        let json = report.to_json().unwrap();
        assert!(!json.contains("\"events\""));
        assert!(!json.contains("\"smoothed\""));
        assert!(json.len() < 8 * 1024);
    }
}
