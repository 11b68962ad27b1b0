//! Spectral analysis of a channel snapshot.
//!
//! The analyzer takes the discrete Fourier transform of the most recent
//! window, keeps the magnitude of the positive-frequency half and sums it
//! into the five EEG bands. Each bin belongs to at most one band.

use crate::core::buffer::ChannelSnapshot;
use crate::core::types::{Band, BandPowers};
use crate::error::{PipelineError, Result};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Optional taper applied to the window before the transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Taper {
    /// Raw samples, no weighting
    #[default]
    Rectangular,
    /// Hann window, lower spectral leakage
    Hann,
}

impl Taper {
    /// Weight for sample `i` of an `n`-sample window.
    pub fn coefficient(self, i: usize, n: usize) -> f64 {
        match self {
            Taper::Rectangular => 1.0,
            Taper::Hann if n <= 1 => 1.0,
            Taper::Hann => 0.5 - 0.5 * (2.0 * PI * i as f64 / (n - 1) as f64).cos(),
        }
    }
}

/// Magnitude spectrum of one window, positive frequencies only.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Width of one bin in Hz (`sampling_rate / window_length`)
    pub resolution_hz: f64,
    /// Magnitude of bins `0 .. window_length / 2`
    pub magnitudes: Vec<f64>,
}

impl Spectrum {
    /// Center frequency of bin `k`.
    pub fn frequency(&self, k: usize) -> f64 {
        k as f64 * self.resolution_hz
    }

    /// Iterate `(frequency_hz, magnitude)` pairs.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.magnitudes
            .iter()
            .enumerate()
            .map(move |(k, &magnitude)| (self.frequency(k), magnitude))
    }

    /// Sum bin magnitudes into bands. Bins outside every band are dropped.
    pub fn band_powers(&self) -> BandPowers {
        let mut powers = BandPowers::zero();
        for (frequency, magnitude) in self.bins() {
            if let Some(band) = Band::for_frequency(frequency) {
                *powers.get_mut(band) += magnitude;
            }
        }
        powers
    }
}

/// Computes band powers from sample windows.
pub struct SpectralAnalyzer {
    sampling_rate_hz: f64,
    min_window: usize,
    taper: Taper,
    /// Caches FFT plans per window length
    planner: FftPlanner<f64>,
}

impl std::fmt::Debug for SpectralAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralAnalyzer")
            .field("sampling_rate_hz", &self.sampling_rate_hz)
            .field("min_window", &self.min_window)
            .field("taper", &self.taper)
            .finish_non_exhaustive()
    }
}

impl SpectralAnalyzer {
    pub fn new(sampling_rate_hz: f64, min_window: usize, taper: Taper) -> Result<Self> {
        if !(sampling_rate_hz.is_finite() && sampling_rate_hz > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "sampling rate must be positive, got {sampling_rate_hz}"
            )));
        }
        if min_window < 2 {
            return Err(PipelineError::InvalidConfig(
                "analysis window must hold at least 2 samples".to_string(),
            ));
        }

        Ok(Self {
            sampling_rate_hz,
            min_window,
            taper,
            planner: FftPlanner::new(),
        })
    }

    pub fn sampling_rate_hz(&self) -> f64 {
        self.sampling_rate_hz
    }

    pub fn min_window(&self) -> usize {
        self.min_window
    }

    pub fn taper(&self) -> Taper {
        self.taper
    }

    /// Magnitude spectrum of a window of samples.
    pub fn spectrum(&mut self, samples: &[f64]) -> Result<Spectrum> {
        let n = samples.len();
        if n < self.min_window {
            return Err(PipelineError::InsufficientData {
                available: n,
                required: self.min_window,
            });
        }

        let taper = self.taper;
        let mut buffer: Vec<Complex<f64>> = samples
            .iter()
            .enumerate()
            .map(|(i, &value)| Complex::new(value * taper.coefficient(i, n), 0.0))
            .collect();

        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        Ok(Spectrum {
            resolution_hz: self.sampling_rate_hz / n as f64,
            magnitudes: buffer.iter().take(n / 2).map(|c| c.norm()).collect(),
        })
    }

    /// Raw band powers for a snapshot.
    pub fn analyze(&mut self, snapshot: &ChannelSnapshot) -> Result<BandPowers> {
        Ok(self.spectrum(&snapshot.samples)?.band_powers())
    }
}
