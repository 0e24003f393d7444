//! Result summaries
//!
//! Projects a finished run into report rows: the per-regime table and the
//! distribution of final balances across games.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution, Max, Median, Min, OrderStatistics};

use crate::simulation::{RegimeAggregate, RegimeStats, SimulationResult};
use crate::Money;

/// Decimal places used for every summarized figure
pub const SUMMARY_DP: u32 = 2;

/// One row of the per-regime table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeSummary {
    pub regime: String,
    pub total_trades: u64,
    pub wins: u64,
    pub losses: u64,
    /// `wins / trades * 100`, 0 for a regime that saw no trades
    pub win_rate_pct: f64,
    pub net_pnl: Money,
}

impl RegimeSummary {
    pub fn from_stats(stats: &RegimeStats) -> Self {
        RegimeSummary {
            regime: stats.regime.to_string(),
            total_trades: stats.trades,
            wins: stats.wins,
            losses: stats.losses,
            win_rate_pct: win_rate_pct(stats.wins, stats.trades),
            net_pnl: stats.net_pnl.round_dp(SUMMARY_DP),
        }
    }
}

/// Win rate in percent rounded half-to-even to two places
pub fn win_rate_pct(wins: u64, trades: u64) -> f64 {
    if trades == 0 {
        return 0.0;
    }
    let pct = Decimal::from(wins) * dec!(100) / Decimal::from(trades);
    pct.round_dp(SUMMARY_DP).to_f64().unwrap_or(0.0)
}

/// Table rows in regime declaration order
pub fn summarize(aggregate: &RegimeAggregate) -> Vec<RegimeSummary> {
    aggregate.iter().map(RegimeSummary::from_stats).collect()
}

/// Distribution of final balances across all games of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalBalanceStats {
    pub games: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub percentile_5: f64,
    pub percentile_95: f64,
    pub min: f64,
    pub max: f64,
    /// Share of games that finished above the starting balance, in percent
    pub pct_profitable: f64,
    /// Share of games that finished below the starting balance, in percent
    pub pct_losing: f64,
}

impl FinalBalanceStats {
    pub fn from_result(result: &SimulationResult, starting_balance: Money) -> Self {
        let finals = result.final_balances();
        if finals.is_empty() {
            return FinalBalanceStats::default();
        }

        let games = finals.len();
        let profitable = finals.iter().filter(|b| **b > starting_balance).count();
        let losing = finals.iter().filter(|b| **b < starting_balance).count();

        let mut data = Data::new(finals.iter().map(|b| b.to_f64()).collect::<Vec<f64>>());

        FinalBalanceStats {
            games,
            mean: data.mean().unwrap_or(0.0),
            // Sample standard deviation is undefined for a single game
            std_dev: data.std_dev().filter(|s| s.is_finite()).unwrap_or(0.0),
            median: data.median(),
            percentile_5: data.percentile(5),
            percentile_95: data.percentile(95),
            min: data.min(),
            max: data.max(),
            pct_profitable: profitable as f64 / games as f64 * 100.0,
            pct_losing: losing as f64 / games as f64 * 100.0,
        }
    }
}
