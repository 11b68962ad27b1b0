//! Fixed-capacity per-channel sample buffer.
//!
//! Samples are appended by the ingestion cycle and read as immutable
//! snapshots by the analysis cycle. When a channel is full the oldest
//! sample is evicted first.

use crate::core::types::Sample;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Immutable copy of one channel's buffered samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    /// Channel the samples were taken from
    pub channel: usize,
    /// Sequence number of the first sample, if any
    pub first_index: Option<u64>,
    /// Sample values, oldest first
    pub samples: Vec<f64>,
}

impl ChannelSnapshot {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Ring buffer holding the most recent samples of every channel.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    /// Per-channel storage, oldest sample at the front
    channels: Vec<VecDeque<Sample>>,
    /// Next sequence number per channel
    next_index: Vec<u64>,
    /// Maximum samples retained per channel
    capacity: usize,
    /// Minimum samples needed before a snapshot can be analyzed
    min_window: usize,
}

impl SampleBuffer {
    /// Create a buffer for `channel_count` channels.
    pub fn new(channel_count: usize, capacity: usize, min_window: usize) -> Result<Self> {
        if channel_count == 0 {
            return Err(PipelineError::InvalidConfig(
                "channel count must be at least 1".to_string(),
            ));
        }
        if capacity < min_window {
            return Err(PipelineError::InvalidConfig(format!(
                "buffer capacity {capacity} cannot hold an analysis window of {min_window}"
            )));
        }

        Ok(Self {
            channels: (0..channel_count)
                .map(|_| VecDeque::with_capacity(capacity))
                .collect(),
            next_index: vec![0; channel_count],
            capacity,
            min_window,
        })
    }

    /// Append one sample, evicting the oldest one when the channel is full.
    pub fn push(&mut self, channel: usize, value: f64) -> Result<Sample> {
        let channels = self.channels.len();
        let queue = self
            .channels
            .get_mut(channel)
            .ok_or(PipelineError::UnknownChannel { channel, channels })?;

        let sample = Sample {
            index: self.next_index[channel],
            channel,
            value,
        };
        if queue.len() == self.capacity {
            queue.pop_front();
        }
        queue.push_back(sample);
        self.next_index[channel] += 1;

        Ok(sample)
    }

    /// Append a run of samples to one channel.
    pub fn extend(&mut self, channel: usize, values: &[f64]) -> Result<()> {
        for &value in values {
            self.push(channel, value)?;
        }
        Ok(())
    }

    /// Copy of a channel's contents, ready for spectral analysis.
    ///
    /// Returns `InsufficientData` while the channel holds fewer samples
    /// than the minimum analysis window.
    pub fn snapshot(&self, channel: usize) -> Result<ChannelSnapshot> {
        let snapshot = self.contents(channel)?;
        if snapshot.len() < self.min_window {
            return Err(PipelineError::InsufficientData {
                available: snapshot.len(),
                required: self.min_window,
            });
        }
        Ok(snapshot)
    }

    /// Copy of a channel's contents regardless of length (for display).
    pub fn contents(&self, channel: usize) -> Result<ChannelSnapshot> {
        let queue = self.channel(channel)?;
        Ok(ChannelSnapshot {
            channel,
            first_index: queue.front().map(|s| s.index),
            samples: queue.iter().map(|s| s.value).collect(),
        })
    }

    /// Number of samples currently held by a channel.
    pub fn len(&self, channel: usize) -> Result<usize> {
        Ok(self.channel(channel)?.len())
    }

    /// Check whether a channel holds a full analysis window.
    pub fn is_ready(&self, channel: usize) -> bool {
        self.len(channel)
            .map(|len| len >= self.min_window)
            .unwrap_or(false)
    }

    /// Total samples ever pushed to a channel.
    pub fn total_pushed(&self, channel: usize) -> Result<u64> {
        self.channel(channel)?;
        Ok(self.next_index[channel])
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn min_window(&self) -> usize {
        self.min_window
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn channel(&self, channel: usize) -> Result<&VecDeque<Sample>> {
        self.channels.get(channel).ok_or(PipelineError::UnknownChannel {
            channel,
            channels: self.channels.len(),
        })
    }
}
