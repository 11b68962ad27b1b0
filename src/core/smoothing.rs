//! Exponential smoothing of band powers across analysis cycles.

use crate::core::types::{Band, BandPowers};
use crate::error::{PipelineError, Result};

/// Default weight given to the newest raw estimate.
pub const DEFAULT_ALPHA: f64 = 0.2;

/// One exponential-moving-average step for every band.
///
/// `smoothed[b] = alpha * raw[b] + (1 - alpha) * previous[b]`
pub fn smooth(alpha: f64, raw: &BandPowers, previous: &BandPowers) -> BandPowers {
    let mut next = BandPowers::zero();
    for band in Band::ALL {
        *next.get_mut(band) = alpha * raw.get(band) + (1.0 - alpha) * previous.get(band);
    }
    next
}

/// Holds the smoothed band state for the lifetime of a pipeline.
///
/// The state starts at zero and is never reset. Updates must be applied
/// once per analysis cycle, in cycle order.
#[derive(Debug, Clone)]
pub struct BandSmoother {
    alpha: f64,
    state: BandPowers,
    updates: u64,
}

impl BandSmoother {
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "smoothing factor must be in (0, 1), got {alpha}"
            )));
        }
        Ok(Self {
            alpha,
            state: BandPowers::zero(),
            updates: 0,
        })
    }

    /// Fold a new raw estimate into the state and return the result.
    pub fn update(&mut self, raw: &BandPowers) -> BandPowers {
        self.state = smooth(self.alpha, raw, &self.state);
        self.updates += 1;
        self.state
    }

    /// Current smoothed state.
    pub fn state(&self) -> BandPowers {
        self.state
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Number of updates applied so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

impl Default for BandSmoother {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            state: BandPowers::zero(),
            updates: 0,
        }
    }
}
