//! Sample acquisition for the EEG cursor agent.
//!
//! The physical device protocol is out of scope. This module defines the
//! [`AcquisitionFeed`] contract the pipeline ingests from, plus feeds for
//! synthetic signals, recorded sessions and tests.

pub mod manual;
pub mod replay;
pub mod synthetic;

use crate::error::Result;

// Re-export commonly used types
pub use manual::ManualFeed;
pub use replay::{parse_recording, write_recording, ReplayFeed};
pub use synthetic::{SyntheticConfig, SyntheticFeed, Tone};

/// A source of raw multi-channel samples.
///
/// `read` returns the samples that became available on `channel` since the
/// previous call, possibly none. An error means the feed cannot deliver
/// this cycle; the pipeline skips the ingestion cycle and tries again on
/// the next tick.
pub trait AcquisitionFeed: Send {
    /// Newly available samples for one channel.
    fn read(&mut self, channel: usize) -> Result<Vec<f64>>;

    /// Sampling rate in Hz.
    fn sampling_rate(&self) -> f64;

    /// Number of channels the feed delivers.
    fn channel_count(&self) -> usize;
}

impl<F: AcquisitionFeed + ?Sized> AcquisitionFeed for Box<F> {
    fn read(&mut self, channel: usize) -> Result<Vec<f64>> {
        (**self).read(channel)
    }

    fn sampling_rate(&self) -> f64 {
        (**self).sampling_rate()
    }

    fn channel_count(&self) -> usize {
        (**self).channel_count()
    }
}
