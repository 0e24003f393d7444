//! Configuration management
//!
//! Handles loading and validation of JSON configuration files. Defaults
//! reproduce the classic setup: a 1000 balance risking 1 per trade at 2R,
//! a 55% base win rate, 500 games of 100 trades, and four market regimes.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::{Instrument, Money};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default = "default_instruments")]
    pub instruments: Vec<Instrument>,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }

    /// Resolve an instrument by key ("1") or name ("ETH/USDT")
    pub fn select_instrument(&self, selector: &str) -> Result<&Instrument, ConfigError> {
        self.instruments
            .iter()
            .find(|i| i.matches(selector))
            .ok_or_else(|| ConfigError::UnknownInstrument {
                selector: selector.to_string(),
                available: self
                    .instruments
                    .iter()
                    .map(|i| i.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            simulation: SimulationConfig::default(),
            instruments: default_instruments(),
        }
    }
}

fn default_instruments() -> Vec<Instrument> {
    vec![
        Instrument::new("1", "BTC/USDT"),
        Instrument::new("2", "ETH/USDT"),
        Instrument::new("3", "SOL/USDT"),
        Instrument::new("4", "SPY"),
    ]
}

/// How the regime-adjusted win chance is kept a valid probability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WinChancePolicy {
    /// Reject configurations whose adjusted win chance leaves (0, 1)
    #[default]
    Strict,
    /// Accept a base win rate in [0, 1] and clamp adjusted chances to [0, 1].
    ///
    /// A base of exactly 1.0 or 0.0 is a certain outcome: every trade wins
    /// (or loses) whatever its regime, and adjustments are ignored.
    Clamp,
}

impl WinChancePolicy {
    /// Effective win chance for a trade in a regime with `adjustment`
    pub fn win_chance(self, base_win_rate: f64, adjustment: f64) -> f64 {
        match self {
            WinChancePolicy::Strict => base_win_rate + adjustment,
            WinChancePolicy::Clamp if base_win_rate >= 1.0 => 1.0,
            WinChancePolicy::Clamp if base_win_rate <= 0.0 => 0.0,
            WinChancePolicy::Clamp => (base_win_rate + adjustment).clamp(0.0, 1.0),
        }
    }
}

impl fmt::Display for WinChancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinChancePolicy::Strict => write!(f, "strict"),
            WinChancePolicy::Clamp => write!(f, "clamp"),
        }
    }
}

impl FromStr for WinChancePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(WinChancePolicy::Strict),
            "clamp" => Ok(WinChancePolicy::Clamp),
            other => Err(format!(
                "unknown win chance policy '{}' (expected strict or clamp)",
                other
            )),
        }
    }
}

/// A market regime and its additive offset to the base win rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeConfig {
    pub name: String,
    pub win_rate_adjustment: f64,
}

impl RegimeConfig {
    pub fn new(name: impl Into<String>, win_rate_adjustment: f64) -> Self {
        RegimeConfig {
            name: name.into(),
            win_rate_adjustment,
        }
    }
}

/// Simulation parameters, immutable for the duration of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub starting_balance: f64,
    /// Amount lost on a losing trade
    pub risk_per_trade: f64,
    /// Profit on a winning trade is `risk_per_trade * reward_to_risk`
    pub reward_to_risk: f64,
    pub base_win_rate: f64,
    pub trades_per_game: usize,
    pub game_count: usize,
    /// Declaration order is the display order; sampling is uniform
    pub regimes: Vec<RegimeConfig>,
    #[serde(default)]
    pub win_chance_policy: WinChancePolicy,
    /// Seed for reproducible runs (None = fresh entropy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            starting_balance: 1000.0,
            risk_per_trade: 1.0,
            reward_to_risk: 2.0,
            base_win_rate: 0.55,
            trades_per_game: 100,
            game_count: 500,
            regimes: vec![
                RegimeConfig::new("ideal setup", 0.10),
                RegimeConfig::new("bullish trend", 0.05),
                RegimeConfig::new("bearish trend", -0.05),
                RegimeConfig::new("choppy", -0.10),
            ],
            win_chance_policy: WinChancePolicy::Strict,
            seed: None,
        }
    }
}

/// Exact decimal amounts the engine moves balances by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeAmounts {
    pub starting_balance: Money,
    /// `risk_per_trade * reward_to_risk`
    pub win_amount: Money,
    /// `risk_per_trade`
    pub loss_amount: Money,
}

/// Finite and representable as a decimal amount
fn to_decimal(value: f64) -> Option<Decimal> {
    if value.is_finite() {
        Decimal::try_from(value).ok()
    } else {
        None
    }
}

/// `start + steps * amount` (or minus), failing on overflow or lost precision
fn reachable_bound(start: Decimal, steps: Decimal, amount: Decimal, gain: bool) -> Option<Decimal> {
    let moved = steps
        .checked_mul(amount)
        .filter(|m| m.scale() >= amount.scale())?;
    let bound = if gain {
        start.checked_add(moved)?
    } else {
        start.checked_sub(moved)?
    };
    // Decimal rescales instead of overflowing; a smaller scale means rounding happened
    (bound.scale() >= start.scale().max(amount.scale())).then_some(bound)
}

impl SimulationConfig {
    /// Check every parameter; the engine refuses to start on any error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trades_per_game == 0 {
            return Err(ConfigError::ZeroTradesPerGame);
        }
        if self.game_count == 0 {
            return Err(ConfigError::ZeroGameCount);
        }
        self.trades_per_game
            .checked_add(1)
            .and_then(|len| len.checked_mul(self.game_count))
            .ok_or(ConfigError::TooLarge {
                game_count: self.game_count,
                trades_per_game: self.trades_per_game,
            })?;

        self.trade_amounts()?;

        let base = self.base_win_rate;
        let base_ok = match self.win_chance_policy {
            WinChancePolicy::Strict => base > 0.0 && base < 1.0,
            WinChancePolicy::Clamp => (0.0..=1.0).contains(&base),
        };
        if !base_ok {
            return Err(ConfigError::BaseWinRateOutOfRange {
                value: base,
                policy: self.win_chance_policy,
            });
        }

        if self.regimes.is_empty() {
            return Err(ConfigError::NoRegimes);
        }
        let mut seen = HashSet::new();
        for regime in &self.regimes {
            let name = regime.name.trim();
            if name.is_empty() {
                return Err(ConfigError::EmptyRegimeName);
            }
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateRegime(name.to_string()));
            }
            if !regime.win_rate_adjustment.is_finite() {
                return Err(ConfigError::NonFiniteAdjustment {
                    regime: name.to_string(),
                    value: regime.win_rate_adjustment,
                });
            }
            if self.win_chance_policy == WinChancePolicy::Strict {
                let chance = self
                    .win_chance_policy
                    .win_chance(base, regime.win_rate_adjustment);
                if !(chance > 0.0 && chance < 1.0) {
                    return Err(ConfigError::WinChanceOutOfRange {
                        regime: name.to_string(),
                        chance,
                    });
                }
            }
        }

        Ok(())
    }

    /// Total number of trades a run will simulate
    pub fn total_trades(&self) -> usize {
        self.game_count.saturating_mul(self.trades_per_game)
    }

    /// Convert the money parameters to exact decimals.
    ///
    /// Fails unless every balance a game can reach, and every per-regime
    /// PnL total a run can accumulate, fits a `Decimal` without rounding.
    pub fn trade_amounts(&self) -> Result<TradeAmounts, ConfigError> {
        let start = to_decimal(self.starting_balance)
            .ok_or(ConfigError::NonFiniteStartingBalance(self.starting_balance))?;
        let risk = to_decimal(self.risk_per_trade)
            .filter(|r| r.is_sign_positive() && !r.is_zero())
            .ok_or(ConfigError::InvalidRiskPerTrade(self.risk_per_trade))?;
        let reward_to_risk = to_decimal(self.reward_to_risk)
            .filter(|r| r.is_sign_positive() && !r.is_zero())
            .ok_or(ConfigError::InvalidRewardToRisk(self.reward_to_risk))?;
        let win = risk
            .checked_mul(reward_to_risk)
            .filter(|w| !w.is_zero())
            .ok_or(ConfigError::WinAmountOutOfRange {
                risk_per_trade: self.risk_per_trade,
                reward_to_risk: self.reward_to_risk,
            })?;

        let balance_error = ConfigError::BalanceOutOfRange {
            starting_balance: self.starting_balance,
            trades_per_game: self.trades_per_game,
        };
        let trades = Decimal::from(self.trades_per_game as u64);
        reachable_bound(start, trades, win, true).ok_or_else(|| balance_error.clone())?;
        reachable_bound(start, trades, risk, false).ok_or(balance_error)?;

        let pnl_error = ConfigError::PnlOutOfRange {
            total_trades: self.total_trades(),
        };
        let total = Decimal::from(self.game_count as u64)
            .checked_mul(trades)
            .ok_or_else(|| pnl_error.clone())?;
        reachable_bound(Decimal::ZERO, total, win, true).ok_or_else(|| pnl_error.clone())?;
        reachable_bound(Decimal::ZERO, total, risk, false).ok_or(pnl_error)?;

        Ok(TradeAmounts {
            starting_balance: Money::from(start),
            win_amount: Money::from(win),
            loss_amount: Money::from(risk),
        })
    }
}
