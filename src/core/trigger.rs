//! Threshold rules that turn smoothed band powers into commands.
//!
//! With the default [`RetriggerConfig`] a rule fires on every analysis cycle
//! its band stays above threshold. A cooldown and/or a hysteresis margin can
//! be configured to limit repeated firing.

use crate::core::types::{Band, BandPowers, Command, TriggerEvent};
use crate::error::{PipelineError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Fire `command` when the smoothed power of `band` is strictly above `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRule {
    pub band: Band,
    pub threshold: f64,
    pub command: Command,
}

impl TriggerRule {
    pub fn new(band: Band, threshold: f64, command: Command) -> Self {
        Self {
            band,
            threshold,
            command,
        }
    }

    /// Gamma above 25000 moves up, Beta above 15000 moves down.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(Band::Gamma, 25_000.0, Command::Up),
            Self::new(Band::Beta, 15_000.0, Command::Down),
        ]
    }
}

/// Controls how a rule behaves while its band stays active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetriggerConfig {
    /// Analysis cycles a rule stays silent after firing (0 = none)
    pub cooldown_cycles: u32,
    /// After firing, the band must drop to `threshold - hysteresis`
    /// before the rule can fire again
    pub hysteresis: Option<f64>,
}

impl RetriggerConfig {
    /// Fire on every cycle above threshold.
    pub fn every_cycle() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(h) = self.hysteresis {
            if !(h.is_finite() && h >= 0.0) {
                return Err(PipelineError::InvalidConfig(format!(
                    "hysteresis must be a non-negative number, got {h}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct RuleState {
    cooldown_remaining: u32,
    armed: bool,
}

impl Default for RuleState {
    fn default() -> Self {
        Self {
            cooldown_remaining: 0,
            armed: true,
        }
    }
}

/// Evaluates trigger rules once per analysis cycle.
#[derive(Debug, Clone)]
pub struct TriggerPolicy {
    rules: Vec<TriggerRule>,
    retrigger: RetriggerConfig,
    states: Vec<RuleState>,
}

impl TriggerPolicy {
    pub fn new(rules: Vec<TriggerRule>, retrigger: RetriggerConfig) -> Result<Self> {
        retrigger.validate()?;
        if let Some(rule) = rules.iter().find(|r| !r.threshold.is_finite()) {
            return Err(PipelineError::InvalidConfig(format!(
                "threshold for {} must be finite",
                rule.band
            )));
        }

        let states = vec![RuleState::default(); rules.len()];
        Ok(Self {
            rules,
            retrigger,
            states,
        })
    }

    pub fn rules(&self) -> &[TriggerRule] {
        &self.rules
    }

    pub fn retrigger(&self) -> &RetriggerConfig {
        &self.retrigger
    }

    /// Events for this cycle, in rule-declaration order.
    pub fn evaluate(&mut self, smoothed: &BandPowers, cycle: u64) -> Vec<TriggerEvent> {
        let timestamp = Utc::now();
        let mut events = Vec::new();

        for (rule, state) in self.rules.iter().zip(self.states.iter_mut()) {
            let power = smoothed.get(rule.band);

            if let Some(h) = self.retrigger.hysteresis {
                if !state.armed && power <= rule.threshold - h {
                    state.armed = true;
                }
            }

            let cooling_down = state.cooldown_remaining > 0;
            if cooling_down {
                state.cooldown_remaining -= 1;
            }

            if power > rule.threshold && state.armed && !cooling_down {
                events.push(TriggerEvent {
                    command: rule.command,
                    band: rule.band,
                    power,
                    threshold: rule.threshold,
                    cycle,
                    timestamp,
                });

                state.cooldown_remaining = self.retrigger.cooldown_cycles;
                if self.retrigger.hysteresis.is_some() {
                    state.armed = false;
                }
            }
        }

        events
    }
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        let rules = TriggerRule::defaults();
        let states = vec![RuleState::default(); rules.len()];
        Self {
            rules,
            retrigger: RetriggerConfig::default(),
            states,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::smoothing::BandSmoother;

    fn powers(beta: f64, gamma: f64) -> BandPowers {
        BandPowers {
            beta,
            gamma,
            ..BandPowers::zero()
        }
    }

    fn commands(events: &[TriggerEvent]) -> Vec<Command> {
        events.iter().map(|e| e.command).collect()
    }

    #[test]
    fn test_strict_threshold() {
        let mut policy = TriggerPolicy::default();
        assert!(policy.evaluate(&powers(15_000.0, 25_000.0), 1).is_empty());

        let events = policy.evaluate(&powers(15_000.001, 25_000.001), 2);
        assert_eq!(commands(&events), vec![Command::Up, Command::Down]);
        assert_eq!(events[0].band, Band::Gamma);
        assert_eq!(events[0].threshold, 25_000.0);
        assert_eq!(events[1].cycle, 2);
    }

    #[test]
    fn test_rules_fire_independently() {
        let mut policy = TriggerPolicy::default();
        assert_eq!(
            commands(&policy.evaluate(&powers(20_000.0, 0.0), 1)),
            vec![Command::Down]
        );
        assert_eq!(
            commands(&policy.evaluate(&powers(0.0, 30_000.0), 2)),
            vec![Command::Up]
        );
    }

    #[test]
    fn test_default_refires_every_cycle() {
        let mut policy = TriggerPolicy::default();
        for cycle in 0..5 {
            assert_eq!(policy.evaluate(&powers(16_000.0, 0.0), cycle).len(), 1);
        }
    }

    #[test]
    fn test_cooldown_suppresses_refire() {
        let retrigger = RetriggerConfig {
            cooldown_cycles: 2,
            hysteresis: None,
        };
        let mut policy = TriggerPolicy::new(TriggerRule::defaults(), retrigger).unwrap();

        let fired: Vec<usize> = (0..7)
            .map(|cycle| policy.evaluate(&powers(16_000.0, 0.0), cycle).len())
            .collect();
        assert_eq!(fired, vec![1, 0, 0, 1, 0, 0, 1]);
    }

    #[test]
    fn test_hysteresis_requires_drop_before_rearm() {
        let retrigger = RetriggerConfig {
            cooldown_cycles: 0,
            hysteresis: Some(1_000.0),
        };
        let mut policy = TriggerPolicy::new(TriggerRule::defaults(), retrigger).unwrap();

        assert_eq!(policy.evaluate(&powers(16_000.0, 0.0), 0).len(), 1);
        assert_eq!(policy.evaluate(&powers(16_000.0, 0.0), 1).len(), 0);
        // Below threshold but inside the hysteresis band: still disarmed
        assert_eq!(policy.evaluate(&powers(14_500.0, 0.0), 2).len(), 0);
        assert_eq!(policy.evaluate(&powers(16_000.0, 0.0), 3).len(), 0);
        // Drop to threshold - hysteresis re-arms
        assert_eq!(policy.evaluate(&powers(14_000.0, 0.0), 4).len(), 0);
        assert_eq!(policy.evaluate(&powers(16_000.0, 0.0), 5).len(), 1);
    }

    #[test]
    fn test_smoothed_gamma_crosses_threshold() {
        let mut smoother = BandSmoother::new(0.2).unwrap();
        let mut policy = TriggerPolicy::default();
        let raw = powers(0.0, 30_000.0);

        let mut first_fire = None;
        for cycle in 1..=12 {
            let state = smoother.update(&raw);
            let events = policy.evaluate(&state, cycle);
            if state.gamma > 25_000.0 {
                assert_eq!(commands(&events), vec![Command::Up]);
                first_fire.get_or_insert(cycle);
            } else {
                assert!(events.is_empty());
            }
        }
        assert_eq!(first_fire, Some(9));
    }

    #[test]
    fn test_invalid_rules() {
        let rules = vec![TriggerRule::new(Band::Alpha, f64::INFINITY, Command::Left)];
        assert!(TriggerPolicy::new(rules, RetriggerConfig::default()).is_err());

        let retrigger = RetriggerConfig {
            cooldown_cycles: 0,
            hysteresis: Some(-1.0),
        };
        assert!(TriggerPolicy::new(TriggerRule::defaults(), retrigger).is_err());
    }
}
