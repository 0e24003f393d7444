//! Monte Carlo simulation engine
//!
//! Runs many independent games of fixed length. Each trade samples a market
//! regime, resolves win/loss against the regime-adjusted win chance, moves
//! the balance by a fixed win or loss amount and records the new balance.
//! Per-regime counters are accumulated across all games of the run.

use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{SimulationConfig, WinChancePolicy};
use crate::error::SimulationError;
use crate::random::RandomSource;
use crate::regime::RegimeSet;
use crate::{Money, Regime};

/// Counters for one regime, accumulated across every game of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeStats {
    pub regime: Regime,
    pub trades: u64,
    pub wins: u64,
    pub losses: u64,
    pub net_pnl: Money,
}

impl RegimeStats {
    pub fn new(regime: Regime) -> Self {
        RegimeStats {
            regime,
            trades: 0,
            wins: 0,
            losses: 0,
            net_pnl: Money::ZERO,
        }
    }

    fn record_win(&mut self, profit: Money) {
        self.trades += 1;
        self.wins += 1;
        self.net_pnl += profit;
    }

    fn record_loss(&mut self, loss: Money) {
        self.trades += 1;
        self.losses += 1;
        self.net_pnl -= loss;
    }
}

/// Per-regime counters in regime declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeAggregate {
    stats: Vec<RegimeStats>,
}

impl RegimeAggregate {
    /// Zeroed counters for every regime in the set
    pub fn new(regimes: &RegimeSet) -> Self {
        RegimeAggregate {
            stats: regimes.regimes().iter().cloned().map(RegimeStats::new).collect(),
        }
    }

    pub fn get(&self, regime: &str) -> Option<&RegimeStats> {
        self.stats.iter().find(|s| s.regime.as_str() == regime)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegimeStats> {
        self.stats.iter()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn total_trades(&self) -> u64 {
        self.stats.iter().map(|s| s.trades).sum()
    }

    pub fn total_wins(&self) -> u64 {
        self.stats.iter().map(|s| s.wins).sum()
    }

    pub fn total_net_pnl(&self) -> Money {
        self.stats.iter().map(|s| s.net_pnl).sum()
    }
}

impl<'a> IntoIterator for &'a RegimeAggregate {
    type Item = &'a RegimeStats;
    type IntoIter = std::slice::Iter<'a, RegimeStats>;

    fn into_iter(self) -> Self::IntoIter {
        self.stats.iter()
    }
}

/// Output of one run: every equity curve plus the regime counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// One curve per game, each `trades_per_game + 1` balances long
    pub equity_curves: Vec<Vec<Money>>,
    pub regime_stats: RegimeAggregate,
}

impl SimulationResult {
    pub fn game_count(&self) -> usize {
        self.equity_curves.len()
    }

    /// Last balance of every game
    pub fn final_balances(&self) -> Vec<Money> {
        self.equity_curves
            .iter()
            .filter_map(|curve| curve.last().copied())
            .collect()
    }

    /// Element-wise mean of all equity curves
    pub fn average_curve(&self) -> Vec<f64> {
        let games = self.equity_curves.len();
        if games == 0 {
            return Vec::new();
        }
        let steps = self.equity_curves[0].len();
        (0..steps)
            .map(|step| {
                let total: f64 = self
                    .equity_curves
                    .iter()
                    .map(|curve| curve[step].to_f64())
                    .sum();
                total / games as f64
            })
            .collect()
    }
}

/// Simulation engine for one validated configuration
///
/// Holds no state between runs; calling [`Simulator::run`] twice with
/// identically seeded sources gives identical results.
#[derive(Debug, Clone)]
pub struct Simulator {
    regimes: RegimeSet,
    policy: WinChancePolicy,
    base_win_rate: f64,
    starting_balance: Money,
    win_amount: Money,
    loss_amount: Money,
    trades_per_game: usize,
    game_count: usize,
}

impl Simulator {
    /// Validate `config` and prepare the engine
    pub fn new(config: &SimulationConfig) -> Result<Self, SimulationError> {
        let regimes = RegimeSet::from_config(config)?;
        let amounts = config.trade_amounts()?;

        Ok(Simulator {
            regimes,
            policy: config.win_chance_policy,
            base_win_rate: config.base_win_rate,
            starting_balance: amounts.starting_balance,
            win_amount: amounts.win_amount,
            loss_amount: amounts.loss_amount,
            trades_per_game: config.trades_per_game,
            game_count: config.game_count,
        })
    }

    pub fn regimes(&self) -> &RegimeSet {
        &self.regimes
    }

    /// Balance change on a winning trade
    pub fn win_amount(&self) -> Money {
        self.win_amount
    }

    /// Balance change (as a positive amount) on a losing trade
    pub fn loss_amount(&self) -> Money {
        self.loss_amount
    }

    /// Run every game to completion
    pub fn run<S>(&self, rng: &mut S) -> Result<SimulationResult, SimulationError>
    where
        S: RandomSource + ?Sized,
    {
        self.run_observed(rng, |_| ControlFlow::Continue(()))
    }

    /// Run every game, ticking `progress` once per finished game
    pub fn run_with_progress<S>(
        &self,
        rng: &mut S,
        progress: &ProgressBar,
    ) -> Result<SimulationResult, SimulationError>
    where
        S: RandomSource + ?Sized,
    {
        let result = self.run_observed(rng, |_| {
            progress.inc(1);
            ControlFlow::Continue(())
        });
        progress.finish_and_clear();
        result
    }

    /// Run until finished or until `cancel` is set; checked between games
    pub fn run_until_cancelled<S>(
        &self,
        rng: &mut S,
        cancel: &AtomicBool,
    ) -> Result<SimulationResult, SimulationError>
    where
        S: RandomSource + ?Sized,
    {
        if cancel.load(Ordering::Relaxed) {
            return Err(SimulationError::Cancelled {
                completed_games: 0,
                game_count: self.game_count,
            });
        }
        self.run_observed(rng, |_| {
            if cancel.load(Ordering::Relaxed) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    /// Core loop. `after_game` sees the number of completed games and may stop the run.
    fn run_observed<S, F>(
        &self,
        rng: &mut S,
        mut after_game: F,
    ) -> Result<SimulationResult, SimulationError>
    where
        S: RandomSource + ?Sized,
        F: FnMut(usize) -> ControlFlow<()>,
    {
        tracing::debug!(
            games = self.game_count,
            trades_per_game = self.trades_per_game,
            regimes = self.regimes.len(),
            "Starting simulation"
        );

        let sampler = self.regimes.sampler();
        let win_chances: Vec<f64> = self
            .regimes
            .adjustments()
            .iter()
            .map(|adjustment| self.policy.win_chance(self.base_win_rate, *adjustment))
            .collect();

        let mut regime_stats = RegimeAggregate::new(&self.regimes);
        let mut equity_curves = Vec::with_capacity(self.game_count);

        for game in 0..self.game_count {
            let mut balance = self.starting_balance;
            let mut curve = Vec::with_capacity(self.trades_per_game + 1);
            curve.push(balance);

            for _ in 0..self.trades_per_game {
                let regime = sampler.sample_index(rng)?;
                let stats = &mut regime_stats.stats[regime];

                let next = if rng.next_unit()? < win_chances[regime] {
                    stats.record_win(self.win_amount);
                    balance.checked_add(self.win_amount)
                } else {
                    stats.record_loss(self.loss_amount);
                    balance.checked_sub(self.loss_amount)
                };
                // Unreachable for validated amounts
                balance = next.ok_or(SimulationError::BalanceOverflow { game })?;

                curve.push(balance);
            }

            equity_curves.push(curve);

            let completed_games = game + 1;
            if after_game(completed_games).is_break() && completed_games < self.game_count {
                tracing::warn!(completed_games, "Simulation cancelled");
                return Err(SimulationError::Cancelled {
                    completed_games,
                    game_count: self.game_count,
                });
            }
        }

        tracing::debug!(
            total_trades = regime_stats.total_trades(),
            "Simulation finished"
        );

        Ok(SimulationResult {
            equity_curves,
            regime_stats,
        })
    }
}

/// Validate `config` and run it once against `rng`
pub fn run_simulation<S>(
    config: &SimulationConfig,
    rng: &mut S,
) -> Result<SimulationResult, SimulationError>
where
    S: RandomSource + ?Sized,
{
    Simulator::new(config)?.run(rng)
}
