//! Deterministic signal generator standing in for an EEG headset.
//!
//! Each read emits the samples that a real device would have produced
//! during one ingestion interval. Fractional sample counts carry over to
//! the next read, so the long-run rate matches the sampling rate exactly.

use crate::acquisition::AcquisitionFeed;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;
use std::time::Duration;

/// A sinusoidal component of the synthetic signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: f64,
    pub amplitude: f64,
}

impl Tone {
    pub fn new(frequency_hz: f64, amplitude: f64) -> Self {
        Self {
            frequency_hz,
            amplitude,
        }
    }
}

impl FromStr for Tone {
    type Err = String;

    /// Parse `"<hz>:<amplitude>"`, e.g. `"40:300"`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (frequency, amplitude) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <hz>:<amplitude>, got '{s}'"))?;
        let frequency_hz: f64 = frequency
            .trim()
            .parse()
            .map_err(|e| format!("invalid frequency '{frequency}': {e}"))?;
        let amplitude: f64 = amplitude
            .trim()
            .parse()
            .map_err(|e| format!("invalid amplitude '{amplitude}': {e}"))?;

        if !(frequency_hz.is_finite() && frequency_hz >= 0.0) {
            return Err(format!("frequency must be non-negative, got {frequency_hz}"));
        }
        Ok(Self::new(frequency_hz, amplitude))
    }
}

/// Parameters for [`SyntheticFeed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub sampling_rate_hz: f64,
    pub channel_count: usize,
    pub tones: Vec<Tone>,
    /// Constant added to every sample (ADC baseline)
    pub offset: f64,
    /// Samples produced per read, usually `sampling_rate * ingest_interval`
    pub samples_per_read: f64,
}

impl SyntheticConfig {
    /// Generator matching a device sampled every `ingest_interval`.
    pub fn new(sampling_rate_hz: f64, channel_count: usize, ingest_interval: Duration) -> Self {
        Self {
            sampling_rate_hz,
            channel_count,
            tones: Vec::new(),
            offset: 0.0,
            samples_per_read: sampling_rate_hz * ingest_interval.as_secs_f64(),
        }
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tones.push(tone);
        self
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }
}

/// Generates a sum of tones on every channel.
///
/// Channel `c` is phase-shifted by `c * PI / 4` so channels are
/// distinguishable while sharing the same spectrum.
#[derive(Debug, Clone)]
pub struct SyntheticFeed {
    config: SyntheticConfig,
    produced: Vec<u64>,
    pending: Vec<f64>,
}

impl SyntheticFeed {
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        if !(config.sampling_rate_hz.is_finite() && config.sampling_rate_hz > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "sampling rate must be positive, got {}",
                config.sampling_rate_hz
            )));
        }
        if !(config.samples_per_read.is_finite() && config.samples_per_read > 0.0) {
            return Err(PipelineError::InvalidConfig(
                "synthetic feed must produce a positive number of samples per read".to_string(),
            ));
        }

        let channels = config.channel_count;
        Ok(Self {
            config,
            produced: vec![0; channels],
            pending: vec![0.0; channels],
        })
    }

    /// Value of sample `index` on `channel`.
    pub fn sample_at(&self, channel: usize, index: u64) -> f64 {
        let t = index as f64 / self.config.sampling_rate_hz;
        let phase = channel as f64 * PI / 4.0;
        self.config.offset
            + self
                .config
                .tones
                .iter()
                .map(|tone| tone.amplitude * (2.0 * PI * tone.frequency_hz * t + phase).sin())
                .sum::<f64>()
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }
}

impl AcquisitionFeed for SyntheticFeed {
    fn read(&mut self, channel: usize) -> Result<Vec<f64>> {
        let channels = self.config.channel_count;
        if channel >= channels {
            return Err(PipelineError::UnknownChannel { channel, channels });
        }

        self.pending[channel] += self.config.samples_per_read;
        let count = self.pending[channel].floor();
        self.pending[channel] -= count;

        let start = self.produced[channel];
        let end = start + count as u64;
        self.produced[channel] = end;

        Ok((start..end).map(|i| self.sample_at(channel, i)).collect())
    }

    fn sampling_rate(&self) -> f64 {
        self.config.sampling_rate_hz
    }

    fn channel_count(&self) -> usize {
        self.config.channel_count
    }
}
