//! Error types for configuration, random sources and simulation runs

use thiserror::Error;

use crate::config::WinChancePolicy;

/// Configuration rejected before any simulation work starts
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("trades_per_game must be > 0")]
    ZeroTradesPerGame,

    #[error("game_count must be > 0")]
    ZeroGameCount,

    #[error("starting_balance ({0}) must be finite and fit a decimal amount")]
    NonFiniteStartingBalance(f64),

    #[error("risk_per_trade ({0}) must be finite and > 0")]
    InvalidRiskPerTrade(f64),

    #[error("reward_to_risk ({0}) must be finite and > 0")]
    InvalidRewardToRisk(f64),

    #[error("win amount {risk_per_trade} x {reward_to_risk} is zero or too large")]
    WinAmountOutOfRange {
        risk_per_trade: f64,
        reward_to_risk: f64,
    },

    #[error(
        "balances reachable from {starting_balance} in {trades_per_game} trades exceed decimal range or precision"
    )]
    BalanceOutOfRange {
        starting_balance: f64,
        trades_per_game: usize,
    },

    #[error("regime PnL over {total_trades} trades exceeds decimal range or precision")]
    PnlOutOfRange { total_trades: usize },

    #[error("base_win_rate ({value}) is out of range for the {policy} win chance policy")]
    BaseWinRateOutOfRange { value: f64, policy: WinChancePolicy },

    #[error("win chance for regime '{regime}' ({chance}) must be strictly between 0 and 1")]
    WinChanceOutOfRange { regime: String, chance: f64 },

    #[error("win_rate_adjustment for regime '{regime}' ({value}) must be finite")]
    NonFiniteAdjustment { regime: String, value: f64 },

    #[error("at least one regime must be configured")]
    NoRegimes,

    #[error("regime names must not be empty")]
    EmptyRegimeName,

    #[error("regime '{0}' is configured more than once")]
    DuplicateRegime(String),

    #[error("{game_count} games x {trades_per_game} trades is too large to simulate")]
    TooLarge {
        game_count: usize,
        trades_per_game: usize,
    },

    #[error("unknown instrument '{selector}'. Available: {available}")]
    UnknownInstrument { selector: String, available: String },
}

/// The random source could not produce a value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RandomSourceError {
    #[error("random source exhausted after {draws} {kind} draws")]
    Exhausted { kind: &'static str, draws: usize },

    #[error("random source produced {value}, outside [0, 1)")]
    OutOfRange { value: String },

    #[error("random source produced index {index} for {len} choices")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Fatal error for a simulation run. Partial results are never returned.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("random source failure: {0}")]
    RandomSource(#[from] RandomSourceError),

    #[error("balance left the decimal range in game {game}")]
    BalanceOverflow { game: usize },

    #[error("simulation cancelled after {completed_games} of {game_count} games")]
    Cancelled {
        completed_games: usize,
        game_count: usize,
    },
}
