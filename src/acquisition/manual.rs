//! In-memory feed for tests and deterministic playback.

use crate::acquisition::AcquisitionFeed;
use crate::error::{PipelineError, Result};
use std::collections::VecDeque;

/// A feed that hands out chunks queued by the caller.
///
/// Reading a channel with nothing queued yields no samples. While marked
/// unavailable every read fails with `FeedUnavailable`.
#[derive(Debug, Clone)]
pub struct ManualFeed {
    queues: Vec<VecDeque<Vec<f64>>>,
    sampling_rate: f64,
    available: bool,
}

impl ManualFeed {
    pub fn new(channel_count: usize, sampling_rate: f64) -> Self {
        Self {
            queues: vec![VecDeque::new(); channel_count],
            sampling_rate,
            available: true,
        }
    }

    /// Queue a chunk to be returned by the next read of `channel`.
    pub fn push_chunk(&mut self, channel: usize, samples: Vec<f64>) {
        if let Some(queue) = self.queues.get_mut(channel) {
            queue.push_back(samples);
        }
    }

    /// Simulate the device dropping out (or coming back).
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Chunks still queued on a channel.
    pub fn pending_chunks(&self, channel: usize) -> usize {
        self.queues.get(channel).map(VecDeque::len).unwrap_or(0)
    }
}

impl AcquisitionFeed for ManualFeed {
    fn read(&mut self, channel: usize) -> Result<Vec<f64>> {
        if !self.available {
            return Err(PipelineError::FeedUnavailable(
                "manual feed marked unavailable".to_string(),
            ));
        }
        let channels = self.queues.len();
        let queue = self
            .queues
            .get_mut(channel)
            .ok_or(PipelineError::UnknownChannel { channel, channels })?;
        Ok(queue.pop_front().unwrap_or_default())
    }

    fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    fn channel_count(&self) -> usize {
        self.queues.len()
    }
}
