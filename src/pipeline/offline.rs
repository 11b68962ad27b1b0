//! Deterministic replay of a recording without timers.

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::pipeline::{AnalysisReport, Pipeline, SessionReport};

/// Feed `rows` (one value per channel per row) through a fresh pipeline.
///
/// One analysis cycle runs after every `sampling_rate * analysis_interval`
/// rows, the cadence a live device would produce. Cycles that find the
/// buffer short are skipped as they would be live.
pub fn analyze_recording(rows: &[Vec<f64>], config: &Config) -> Result<SessionReport> {
    analyze_recording_with(rows, config, |_| {})
}

/// Like [`analyze_recording`], handing every completed cycle to `on_report`.
pub fn analyze_recording_with<F>(
    rows: &[Vec<f64>],
    config: &Config,
    mut on_report: F,
) -> Result<SessionReport>
where
    F: FnMut(&AnalysisReport),
{
    if let Some((index, row)) = rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != config.channel_count)
    {
        return Err(PipelineError::InvalidConfig(format!(
            "recording row {index} has {} channels, pipeline expects {}",
            row.len(),
            config.channel_count
        )));
    }

    let mut pipeline = Pipeline::new(config)?;
    let step = config.samples_per_analysis().max(1);
    for block in rows.chunks(step) {
        for channel in 0..config.channel_count {
            let samples: Vec<f64> = block.iter().map(|row| row[channel]).collect();
            pipeline.push_samples(channel, &samples)?;
        }

        // Only full blocks complete an analysis interval
        if block.len() == step {
            match pipeline.analyze_once() {
                Ok(report) => on_report(&report),
                Err(e) if e.is_skip() => {}
                Err(e) => return Err(e),
            }
        }
    }

    Ok(pipeline.session_report())
}
