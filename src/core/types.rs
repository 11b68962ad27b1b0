//! Data types shared by the pipeline stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five canonical EEG frequency bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl Band {
    /// All bands in ascending frequency order.
    pub const ALL: [Band; 5] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta, Band::Gamma];

    /// Stable position in `Band::ALL`.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Half-open frequency interval `[low, high)` in Hz.
    pub const fn range(self) -> (f64, f64) {
        match self {
            Band::Delta => (0.5, 4.0),
            Band::Theta => (4.0, 10.0),
            Band::Alpha => (10.0, 15.0),
            Band::Beta => (15.0, 35.0),
            Band::Gamma => (35.0, 50.0),
        }
    }

    /// Check if a frequency falls inside this band.
    pub fn contains(self, frequency_hz: f64) -> bool {
        let (low, high) = self.range();
        frequency_hz >= low && frequency_hz < high
    }

    /// The band containing a frequency, if any.
    ///
    /// Intervals do not overlap, so at most one band matches.
    pub fn for_frequency(frequency_hz: f64) -> Option<Band> {
        Band::ALL.into_iter().find(|band| band.contains(frequency_hz))
    }

    pub fn name(self) -> &'static str {
        match self {
            Band::Delta => "Delta",
            Band::Theta => "Theta",
            Band::Alpha => "Alpha",
            Band::Beta => "Beta",
            Band::Gamma => "Gamma",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// One non-negative power value per band.
///
/// Used both for the raw estimate of a single analysis cycle and for the
/// smoothed state carried across cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandPowers {
    pub delta: f64,
    pub theta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl BandPowers {
    /// All bands at zero power.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from values in `Band::ALL` order.
    pub fn from_array(values: [f64; 5]) -> Self {
        Self {
            delta: values[0],
            theta: values[1],
            alpha: values[2],
            beta: values[3],
            gamma: values[4],
        }
    }

    pub fn to_array(&self) -> [f64; 5] {
        [self.delta, self.theta, self.alpha, self.beta, self.gamma]
    }

    pub fn get(&self, band: Band) -> f64 {
        match band {
            Band::Delta => self.delta,
            Band::Theta => self.theta,
            Band::Alpha => self.alpha,
            Band::Beta => self.beta,
            Band::Gamma => self.gamma,
        }
    }

    pub fn get_mut(&mut self, band: Band) -> &mut f64 {
        match band {
            Band::Delta => &mut self.delta,
            Band::Theta => &mut self.theta,
            Band::Alpha => &mut self.alpha,
            Band::Beta => &mut self.beta,
            Band::Gamma => &mut self.gamma,
        }
    }

    /// Iterate `(band, power)` pairs in ascending frequency order.
    pub fn iter(&self) -> impl Iterator<Item = (Band, f64)> + '_ {
        Band::ALL.into_iter().map(move |band| (band, self.get(band)))
    }

    /// Sum over all bands.
    pub fn total(&self) -> f64 {
        self.to_array().iter().sum()
    }

    /// The band with the highest power (Delta on ties or all zeros).
    pub fn dominant(&self) -> Band {
        self.iter()
            .fold((Band::Delta, f64::MIN), |best, (band, power)| {
                if power > best.1 {
                    (band, power)
                } else {
                    best
                }
            })
            .0
    }
}

/// Discrete directional command sent to the actuation sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Command {
    Up,
    Down,
    Left,
    Right,
}

impl Command {
    pub const ALL: [Command; 4] = [Command::Up, Command::Down, Command::Left, Command::Right];

    /// Unit screen-space direction `(dx, dy)`, y growing downwards.
    pub const fn direction(self) -> (i64, i64) {
        match self {
            Command::Up => (0, -1),
            Command::Down => (0, 1),
            Command::Left => (-1, 0),
            Command::Right => (1, 0),
        }
    }

    /// Stable position in `Command::ALL`.
    pub const fn index(self) -> usize {
        match self {
            Command::Up => 0,
            Command::Down => 1,
            Command::Left => 2,
            Command::Right => 3,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Command::Up => "UP",
            Command::Down => "DOWN",
            Command::Left => "LEFT",
            Command::Right => "RIGHT",
        })
    }
}

/// A single recorded reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Per-channel sequence number, starting at 0
    pub index: u64,
    /// Channel the reading belongs to
    pub channel: usize,
    /// Raw value as delivered by the feed
    pub value: f64,
}

/// An actuation command raised by the trigger policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub command: Command,
    pub band: Band,
    /// Smoothed power that crossed the threshold
    pub power: f64,
    pub threshold: f64,
    /// Analysis cycle that produced the event
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
}
