//! The analysis stage: spectrum, smoothing and trigger evaluation.

use crate::config::Config;
use crate::core::{
    BandPowers, BandSmoother, ChannelSnapshot, SampleBuffer, SpectralAnalyzer, TriggerPolicy,
};
use crate::error::Result;
use crate::pipeline::AnalysisReport;
use chrono::Utc;

/// Analyzer, smoother and trigger policy for one analysis channel.
///
/// Smoothed state only changes when a cycle completes. A cycle that fails
/// (short window) leaves the stage exactly as it was.
#[derive(Debug)]
pub struct AnalysisStage {
    analyzer: SpectralAnalyzer,
    smoother: BandSmoother,
    policy: TriggerPolicy,
    channel: usize,
    cycle: u64,
}

impl AnalysisStage {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::from_parts(
            SpectralAnalyzer::new(config.sampling_rate_hz, config.min_window, config.taper)?,
            BandSmoother::new(config.smoothing_alpha)?,
            TriggerPolicy::new(config.rules.clone(), config.retrigger.clone())?,
            config.analysis_channel,
        ))
    }

    pub fn from_parts(
        analyzer: SpectralAnalyzer,
        smoother: BandSmoother,
        policy: TriggerPolicy,
        channel: usize,
    ) -> Self {
        Self {
            analyzer,
            smoother,
            policy,
            channel,
            cycle: 0,
        }
    }

    /// Run one cycle on the analysis channel of `buffer`.
    pub fn run(&mut self, buffer: &SampleBuffer) -> Result<AnalysisReport> {
        let snapshot = buffer.snapshot(self.channel)?;
        self.analyze_snapshot(&snapshot)
    }

    /// Run one cycle on an already taken snapshot.
    pub fn analyze_snapshot(&mut self, snapshot: &ChannelSnapshot) -> Result<AnalysisReport> {
        let raw = self.analyzer.analyze(snapshot)?;

        self.cycle += 1;
        let smoothed = self.smoother.update(&raw);
        let events = self.policy.evaluate(&smoothed, self.cycle);

        tracing::debug!(
            cycle = self.cycle,
            window = snapshot.len(),
            dominant = %smoothed.dominant(),
            "analysis cycle complete"
        );
        for event in &events {
            tracing::info!(
                command = %event.command,
                band = %event.band,
                power = event.power,
                threshold = event.threshold,
                "trigger fired"
            );
        }

        Ok(AnalysisReport {
            cycle: self.cycle,
            timestamp: Utc::now(),
            channel: snapshot.channel,
            window_len: snapshot.len(),
            raw,
            smoothed,
            events,
        })
    }

    /// Completed cycles so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn smoothed(&self) -> BandPowers {
        self.smoother.state()
    }

    pub fn policy(&self) -> &TriggerPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Band, Command};
    use crate::error::PipelineError;
    use std::f64::consts::PI;

    fn stage() -> AnalysisStage {
        AnalysisStage::new(&Config::default()).unwrap()
    }

    fn snapshot(samples: Vec<f64>) -> ChannelSnapshot {
        ChannelSnapshot {
            channel: 0,
            first_index: Some(0),
            samples,
        }
    }

    #[test]
    fn test_silence_produces_no_events() {
        let mut stage = stage();
        let report = stage.analyze_snapshot(&snapshot(vec![0.0; 256])).unwrap();

        assert_eq!(report.cycle, 1);
        assert_eq!(report.raw, BandPowers::zero());
        assert_eq!(report.smoothed, BandPowers::zero());
        assert!(report.events.is_empty());
    }

    #[test]
    fn test_short_window_leaves_state_unchanged() {
        let mut stage = stage();
        let tone: Vec<f64> = (0..256)
            .map(|i| 100.0 * (2.0 * PI * 20.0 * i as f64 / 250.0).sin())
            .collect();
        stage.analyze_snapshot(&snapshot(tone)).unwrap();
        let before = stage.smoothed();

        let err = stage.analyze_snapshot(&snapshot(vec![1.0; 100])).unwrap_err();
        assert_eq!(
            err,
            PipelineError::InsufficientData {
                available: 100,
                required: 256
            }
        );
        assert_eq!(stage.smoothed(), before);
        assert_eq!(stage.cycle(), 1);
    }

    #[test]
    fn test_strong_beta_moves_down() {
        let mut stage = stage();
        let tone: Vec<f64> = (0..256)
            .map(|i| 200.0 * (2.0 * PI * 20.0 * i as f64 / 250.0).sin())
            .collect();

        let mut fired = None;
        for _ in 0..20 {
            let report = stage.analyze_snapshot(&snapshot(tone.clone())).unwrap();
            if let Some(event) = report.events.first() {
                fired = Some(event.clone());
                break;
            }
        }

        let event = fired.expect("beta rule should fire");
        assert_eq!(event.band, Band::Beta);
        assert_eq!(event.command, Command::Down);
        assert!(event.power > 15_000.0);
    }

    #[test]
    fn test_run_reads_analysis_channel() {
        let mut stage = stage();
        let mut buffer = SampleBuffer::new(1, 256, 256).unwrap();
        assert!(stage.run(&buffer).is_err());

        buffer.extend(0, &[0.0; 256]).unwrap();
        let report = stage.run(&buffer).unwrap();
        assert_eq!(report.window_len, 256);
        assert_eq!(report.channel, 0);
    }
}
