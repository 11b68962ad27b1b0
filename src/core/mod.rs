//! Core signal processing for the EEG cursor agent.
//!
//! This module contains:
//! - The per-channel sample buffer
//! - Spectral analysis into the five EEG bands
//! - Exponential smoothing of band powers
//! - The threshold trigger policy

pub mod buffer;
pub mod smoothing;
pub mod spectral;
pub mod trigger;
pub mod types;

// Re-export commonly used types
pub use buffer::{ChannelSnapshot, SampleBuffer};
pub use smoothing::{smooth, BandSmoother, DEFAULT_ALPHA};
pub use spectral::{SpectralAnalyzer, Spectrum, Taper};
pub use trigger::{RetriggerConfig, TriggerPolicy, TriggerRule};
pub use types::{Band, BandPowers, Command, Sample, TriggerEvent};
