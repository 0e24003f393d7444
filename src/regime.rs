//! Market regimes and the per-trade regime sampler

use crate::config::SimulationConfig;
use crate::error::{ConfigError, RandomSourceError};
use crate::random::RandomSource;
use crate::Regime;

/// Ordered regime labels with their win-rate adjustments
///
/// Adding a regime is a configuration change: the engine looks the
/// adjustment up by index instead of branching on names.
#[derive(Debug, Clone)]
pub struct RegimeSet {
    regimes: Vec<Regime>,
    adjustments: Vec<f64>,
}

impl RegimeSet {
    /// Build from a validated configuration
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (regimes, adjustments) = config
            .regimes
            .iter()
            .map(|r| (Regime::new(r.name.trim()), r.win_rate_adjustment))
            .unzip();
        Ok(RegimeSet {
            regimes,
            adjustments,
        })
    }

    pub fn len(&self) -> usize {
        self.regimes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regimes.is_empty()
    }

    pub fn regimes(&self) -> &[Regime] {
        &self.regimes
    }

    pub fn regime(&self, index: usize) -> Option<&Regime> {
        self.regimes.get(index)
    }

    /// Adjustments in declaration order, parallel to [`RegimeSet::regimes`]
    pub fn adjustments(&self) -> &[f64] {
        &self.adjustments
    }

    /// Adjustment for a regime by label, if configured
    pub fn adjustment_for(&self, name: &str) -> Option<f64> {
        self.regimes
            .iter()
            .position(|r| r.as_str() == name)
            .map(|i| self.adjustments[i])
    }

    pub fn sampler(&self) -> RegimeSampler<'_> {
        RegimeSampler { set: self }
    }
}

/// Draws one regime per trade, uniformly and with replacement
#[derive(Debug, Clone, Copy)]
pub struct RegimeSampler<'a> {
    set: &'a RegimeSet,
}

impl<'a> RegimeSampler<'a> {
    /// Index of the drawn regime within the set, always `< len()`
    pub fn sample_index<S>(&self, rng: &mut S) -> Result<usize, RandomSourceError>
    where
        S: RandomSource + ?Sized,
    {
        let len = self.set.len();
        let index = rng.next_index(len)?;
        if index < len {
            Ok(index)
        } else {
            Err(RandomSourceError::IndexOutOfRange { index, len })
        }
    }

    pub fn sample<S>(&self, rng: &mut S) -> Result<&'a Regime, RandomSourceError>
    where
        S: RandomSource + ?Sized,
    {
        let index = self.sample_index(rng)?;
        let len = self.set.len();
        self.set
            .regime(index)
            .ok_or(RandomSourceError::IndexOutOfRange { index, len })
    }
}
