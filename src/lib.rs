//! Regime Monte Carlo
//!
//! Simulates many independent trading careers with a fixed risk/reward
//! profile, where every trade's win chance depends on a randomly sampled
//! market regime, and summarizes the resulting equity curves per regime.

pub mod config;
pub mod error;
pub mod random;
pub mod regime;
pub mod report;
pub mod simulation;
pub mod stats;
pub mod types;

pub use config::{Config, RegimeConfig, SimulationConfig, TradeAmounts, WinChancePolicy};
pub use error::{ConfigError, RandomSourceError, SimulationError};
pub use random::{RandomSource, RngSource, ScriptedSource};
pub use simulation::{run_simulation, SimulationResult, Simulator};
pub use types::*;
