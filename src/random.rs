//! Random sources
//!
//! The engine never touches a global RNG. Every draw goes through a
//! [`RandomSource`] handed in by the caller: a seeded [`RngSource`] for
//! real runs, or a [`ScriptedSource`] replaying fixed values in tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

use crate::error::RandomSourceError;

/// Capability the simulator draws randomness from
pub trait RandomSource {
    /// Uniform value in [0, 1)
    fn next_unit(&mut self) -> Result<f64, RandomSourceError>;

    /// Uniform index in `0..len`; `len` is always > 0
    fn next_index(&mut self, len: usize) -> Result<usize, RandomSourceError>;
}

/// Adapter from any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        RngSource { rng }
    }
}

impl RngSource<ChaCha8Rng> {
    /// ChaCha8 stream; identical output on every platform for a given seed
    pub fn seeded(seed: u64) -> Self {
        RngSource::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> Result<f64, RandomSourceError> {
        Ok(self.rng.gen::<f64>())
    }

    fn next_index(&mut self, len: usize) -> Result<usize, RandomSourceError> {
        Ok(self.rng.gen_range(0..len))
    }
}

/// Fresh seed from OS entropy, for runs where the caller gave none
pub fn entropy_seed() -> u64 {
    rand::thread_rng().gen()
}

/// Replays fixed draws and fails once either queue runs dry
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    units: VecDeque<f64>,
    indices: VecDeque<usize>,
    unit_draws: usize,
    index_draws: usize,
}

impl ScriptedSource {
    pub fn new(units: impl IntoIterator<Item = f64>, indices: impl IntoIterator<Item = usize>) -> Self {
        ScriptedSource {
            units: units.into_iter().collect(),
            indices: indices.into_iter().collect(),
            unit_draws: 0,
            index_draws: 0,
        }
    }

    /// Values left to draw as (units, indices)
    pub fn remaining(&self) -> (usize, usize) {
        (self.units.len(), self.indices.len())
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> Result<f64, RandomSourceError> {
        let value = self.units.pop_front().ok_or(RandomSourceError::Exhausted {
            kind: "unit",
            draws: self.unit_draws,
        })?;
        self.unit_draws += 1;
        if !(0.0..1.0).contains(&value) {
            return Err(RandomSourceError::OutOfRange {
                value: value.to_string(),
            });
        }
        Ok(value)
    }

    fn next_index(&mut self, len: usize) -> Result<usize, RandomSourceError> {
        let index = self.indices.pop_front().ok_or(RandomSourceError::Exhausted {
            kind: "index",
            draws: self.index_draws,
        })?;
        self.index_draws += 1;
        // Scripts are written against a known regime count; wrap rather than fail
        Ok(index % len)
    }
}
