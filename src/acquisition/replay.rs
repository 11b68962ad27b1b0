//! Playback of recorded sessions.
//!
//! A recording is a JSON Lines file: one JSON array per line holding the
//! value of every channel at one sampling instant.
//!
//! ```text
//! [512.0, 498.5]
//! [515.25, 501.0]
//! ```

use crate::acquisition::AcquisitionFeed;
use crate::error::{PipelineError, Result};
use std::io::Write;
use std::path::Path;

/// Parse a JSON Lines recording into rows of channel values.
///
/// Blank lines are ignored. Every row must have the same, non-zero width.
pub fn parse_recording(text: &str) -> Result<Vec<Vec<f64>>> {
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: Vec<f64> = serde_json::from_str(line).map_err(|e| {
            PipelineError::FeedUnavailable(format!("line {}: {e}", line_no + 1))
        })?;

        if row.is_empty() {
            return Err(PipelineError::FeedUnavailable(format!(
                "line {}: row has no channels",
                line_no + 1
            )));
        }
        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(PipelineError::FeedUnavailable(format!(
                    "line {}: expected {} channels, found {}",
                    line_no + 1,
                    first.len(),
                    row.len()
                )));
            }
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Write rows of channel values as a JSON Lines recording.
pub fn write_recording(path: &Path, rows: &[Vec<f64>]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    for row in rows {
        let line = serde_json::to_string(row).map_err(std::io::Error::other)?;
        writeln!(file, "{line}")?;
    }
    file.flush()
}

/// Feed that replays a recording in fixed-size chunks.
///
/// Once a channel is exhausted its reads fail with `FeedUnavailable`,
/// unless the feed loops.
#[derive(Debug, Clone)]
pub struct ReplayFeed {
    /// Samples per channel
    channels: Vec<Vec<f64>>,
    positions: Vec<usize>,
    chunk_size: usize,
    sampling_rate: f64,
    looping: bool,
}

impl ReplayFeed {
    /// Build from rows of channel values.
    pub fn from_rows(rows: &[Vec<f64>], sampling_rate: f64, chunk_size: usize) -> Result<Self> {
        let width = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| PipelineError::FeedUnavailable("recording is empty".to_string()))?;
        if chunk_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "replay chunk size must be at least 1".to_string(),
            ));
        }
        if width == 0 {
            return Err(PipelineError::FeedUnavailable(
                "row 0: row has no channels".to_string(),
            ));
        }
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            return Err(PipelineError::FeedUnavailable(format!(
                "row {index}: expected {width} channels, found {}",
                row.len()
            )));
        }

        let channels = (0..width)
            .map(|c| rows.iter().map(|row| row[c]).collect())
            .collect();

        Ok(Self {
            channels,
            positions: vec![0; width],
            chunk_size,
            sampling_rate,
            looping: false,
        })
    }

    /// Load a JSON Lines recording from disk.
    pub fn from_path(path: &Path, sampling_rate: f64, chunk_size: usize) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::FeedUnavailable(format!("cannot read recording {}: {e}", path.display()))
        })?;
        Self::from_rows(&parse_recording(&text)?, sampling_rate, chunk_size)
    }

    /// Restart from the beginning instead of failing when exhausted.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Samples per channel in the recording.
    pub fn len(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples not yet delivered on a channel.
    pub fn remaining(&self, channel: usize) -> usize {
        self.positions
            .get(channel)
            .map(|&pos| self.len().saturating_sub(pos))
            .unwrap_or(0)
    }

    /// Full recording of one channel.
    pub fn channel_samples(&self, channel: usize) -> Option<&[f64]> {
        self.channels.get(channel).map(Vec::as_slice)
    }
}

impl AcquisitionFeed for ReplayFeed {
    fn read(&mut self, channel: usize) -> Result<Vec<f64>> {
        let channels = self.channels.len();
        let samples = self
            .channels
            .get(channel)
            .ok_or(PipelineError::UnknownChannel { channel, channels })?;

        let mut pos = self.positions[channel];
        if pos >= samples.len() {
            if !self.looping {
                return Err(PipelineError::FeedUnavailable(
                    "recording exhausted".to_string(),
                ));
            }
            pos = 0;
        }

        let end = (pos + self.chunk_size).min(samples.len());
        let chunk = samples[pos..end].to_vec();
        self.positions[channel] = end;
        Ok(chunk)
    }

    fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
