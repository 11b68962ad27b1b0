//! Configuration for the EEG cursor agent.

use crate::actuation::DEFAULT_CURSOR_STEP;
use crate::core::{RetriggerConfig, Taper, TriggerRule, DEFAULT_ALPHA};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Largest cursor step accepted, in pixels.
pub const MAX_CURSOR_STEP: i64 = 10_000;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device sampling rate in Hz
    pub sampling_rate_hz: f64,

    /// Number of acquisition channels
    pub channel_count: usize,

    /// Samples retained per channel
    pub buffer_capacity: usize,

    /// Minimum samples before a spectrum is computed
    pub min_window: usize,

    /// Channel the analysis cycle reads
    pub analysis_channel: usize,

    /// Exponential smoothing factor, in (0, 1)
    pub smoothing_alpha: f64,

    /// Taper applied before the transform
    pub taper: Taper,

    /// Period of the ingestion cycle
    #[serde(with = "duration_ms")]
    pub ingest_interval: Duration,

    /// Period of the analysis cycle
    #[serde(with = "duration_ms")]
    pub analysis_interval: Duration,

    /// How long an arrow stays lit after a command
    #[serde(with = "duration_ms")]
    pub flash_duration: Duration,

    /// Time in-flight actuation tasks get to finish on shutdown
    #[serde(with = "duration_ms")]
    pub shutdown_grace: Duration,

    /// Trigger rules, evaluated in order
    pub rules: Vec<TriggerRule>,

    /// Re-trigger behavior while a band stays active
    pub retrigger: RetriggerConfig,

    /// Pixels the virtual cursor moves per command
    pub cursor_step_px: i64,

    /// Path for exporting session reports
    pub export_path: PathBuf,

    /// Path for recordings and other state
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eeg-cursor-agent");

        Self {
            sampling_rate_hz: 250.0,
            channel_count: 1,
            buffer_capacity: 256,
            min_window: 256,
            analysis_channel: 0,
            smoothing_alpha: DEFAULT_ALPHA,
            taper: Taper::Rectangular,
            ingest_interval: Duration::from_millis(10),
            analysis_interval: Duration::from_millis(1000),
            flash_duration: Duration::from_millis(150),
            shutdown_grace: Duration::from_millis(500),
            rules: TriggerRule::defaults(),
            retrigger: RetriggerConfig::default(),
            cursor_step_px: DEFAULT_CURSOR_STEP,
            export_path: data_dir.join("sessions"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::Parse(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eeg-cursor-agent")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)?;
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    /// Samples the device delivers during one analysis interval.
    pub fn samples_per_analysis(&self) -> usize {
        (self.sampling_rate_hz * self.analysis_interval.as_secs_f64()).round() as usize
    }

    /// Check that the values can drive a pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(self.sampling_rate_hz.is_finite() && self.sampling_rate_hz > 0.0) {
            return invalid(format!(
                "sampling_rate_hz must be positive, got {}",
                self.sampling_rate_hz
            ));
        }
        if self.channel_count == 0 {
            return invalid("channel_count must be at least 1".to_string());
        }
        if self.analysis_channel >= self.channel_count {
            return invalid(format!(
                "analysis_channel {} out of range for {} channels",
                self.analysis_channel, self.channel_count
            ));
        }
        if self.min_window < 2 {
            return invalid("min_window must be at least 2".to_string());
        }
        if self.buffer_capacity < self.min_window {
            return invalid(format!(
                "buffer_capacity {} is smaller than min_window {}",
                self.buffer_capacity, self.min_window
            ));
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha < 1.0) {
            return invalid(format!(
                "smoothing_alpha must be in (0, 1), got {}",
                self.smoothing_alpha
            ));
        }
        if self.ingest_interval.is_zero() || self.analysis_interval.is_zero() {
            return invalid("cycle intervals must be non-zero".to_string());
        }
        if let Some(rule) = self.rules.iter().find(|r| !r.threshold.is_finite()) {
            return invalid(format!("threshold for {} must be finite", rule.band));
        }
        if !(1..=MAX_CURSOR_STEP).contains(&self.cursor_step_px) {
            return invalid(format!(
                "cursor_step_px must be in 1..={MAX_CURSOR_STEP}, got {}",
                self.cursor_step_px
            ));
        }
        if let Err(e) = self.retrigger.validate() {
            return invalid(e.to_string());
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration as integer milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Band, Command};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sampling_rate_hz, 250.0);
        assert_eq!(config.min_window, 256);
        assert_eq!(config.smoothing_alpha, 0.2);
        assert_eq!(config.ingest_interval, Duration::from_millis(10));
        assert_eq!(config.analysis_interval, Duration::from_secs(1));
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].band, Band::Gamma);
        assert_eq!(config.rules[1].command, Command::Down);
        assert_eq!(config.retrigger.cooldown_cycles, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_json_round_trip() {
        let mut config = Config::default();
        config.taper = Taper::Hann;
        config.retrigger.hysteresis = Some(500.0);

        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"ingest_interval\": 10"));
        assert!(json.contains("\"taper\": \"hann\""));

        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.taper, Taper::Hann);
        assert_eq!(parsed.retrigger.hysteresis, Some(500.0));
        assert_eq!(parsed.flash_duration, Duration::from_millis(150));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = serde_json::from_str(r#"{"channel_count": 4}"#).unwrap();
        assert_eq!(parsed.channel_count, 4);
        assert_eq!(parsed.buffer_capacity, 256);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.smoothing_alpha = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.buffer_capacity = 128;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis_channel = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ingest_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cursor_step_px = i64::MAX;
        assert!(config.validate().is_err());
        config.cursor_step_px = 0;
        assert!(config.validate().is_err());
        config.cursor_step_px = MAX_CURSOR_STEP;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_samples_per_analysis() {
        let config = Config::default();
        assert_eq!(config.samples_per_analysis(), 250);
    }
}
