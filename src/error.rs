//! Error types for the band-power pipeline.
//!
//! None of these are fatal. Ingestion and analysis skip the current cycle,
//! actuation failures are logged and counted.

use crate::core::Command;
use thiserror::Error;

/// Errors raised by the pipeline core and its collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The buffer does not yet hold a full analysis window.
    #[error("insufficient data: {available} samples buffered, {required} required")]
    InsufficientData { available: usize, required: usize },

    /// The acquisition feed could not supply samples for this cycle.
    #[error("acquisition feed unavailable: {0}")]
    FeedUnavailable(String),

    /// The actuation sink rejected or could not perform a command.
    #[error("actuation of {command} failed: {reason}")]
    ActuationFailure { command: Command, reason: String },

    /// A channel id outside the configured channel count.
    #[error("unknown channel {channel} (pipeline has {channels} channels)")]
    UnknownChannel { channel: usize, channels: usize },

    /// Configuration values that cannot drive a pipeline.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// Whether this error means "skip the cycle and try again later".
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            PipelineError::InsufficientData { .. } | PipelineError::FeedUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PipelineError::InsufficientData {
            available: 100,
            required: 256,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: 100 samples buffered, 256 required"
        );

        let err = PipelineError::ActuationFailure {
            command: Command::Up,
            reason: "sink closed".to_string(),
        };
        assert!(err.to_string().contains("UP"));
    }

    #[test]
    fn test_skip_classification() {
        assert!(PipelineError::FeedUnavailable("eof".into()).is_skip());
        assert!(!PipelineError::InvalidConfig("alpha".into()).is_skip());
    }
}
