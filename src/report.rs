//! Report rendering for the command line
//!
//! Turns a finished run into a text table, CSV rows or a JSON document.
//! Charting is left to whatever consumes the JSON output.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::io;
use std::str::FromStr;

use crate::config::SimulationConfig;
use crate::simulation::SimulationResult;
use crate::stats::{summarize, FinalBalanceStats, RegimeSummary};
use crate::{Instrument, Money};

/// Column headers of the per-regime table
pub const TABLE_HEADERS: [&str; 6] = [
    "Market Type",
    "Total Trades",
    "Wins",
    "Losses",
    "Win Rate (%)",
    "PnL ($)",
];

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "unknown format '{}' (expected table, csv or json)",
                other
            )),
        }
    }
}

/// Everything a renderer needs about one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub instrument: Instrument,
    pub seed: u64,
    pub config: SimulationConfig,
    pub regimes: Vec<RegimeSummary>,
    pub final_balances: FinalBalanceStats,
    pub average_curve: Vec<f64>,
}

impl SimulationReport {
    pub fn new(
        instrument: Instrument,
        seed: u64,
        config: SimulationConfig,
        result: &SimulationResult,
    ) -> Self {
        let starting_balance = Money::from_f64(config.starting_balance);
        SimulationReport {
            instrument,
            seed,
            regimes: summarize(&result.regime_stats),
            final_balances: FinalBalanceStats::from_result(result, starting_balance),
            average_curve: result.average_curve(),
            config,
        }
    }

    pub fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        Ok(match format {
            OutputFormat::Table => self.to_table()?,
            OutputFormat::Csv => {
                let mut buf = Vec::new();
                write_csv(&self.regimes, &mut buf)?;
                String::from_utf8(buf)?
            }
            OutputFormat::Json => serde_json::to_string_pretty(self)?,
        })
    }

    /// Human-readable report: header, regime table, final balance distribution
    pub fn to_table(&self) -> Result<String, fmt::Error> {
        let mut out = String::new();
        let rule = "=".repeat(78);
        let c = &self.config;

        writeln!(out, "{}", rule)?;
        writeln!(out, "MONTE CARLO SIMULATION - {}", self.instrument.name)?;
        writeln!(out, "{}", rule)?;
        writeln!(
            out,
            "Games: {}  Trades/Game: {}  Start: ${:.2}  Risk: ${:.2}  R:R {:.2}  Base Win: {:.2}%",
            c.game_count,
            c.trades_per_game,
            c.starting_balance,
            c.risk_per_trade,
            c.reward_to_risk,
            c.base_win_rate * 100.0
        )?;
        writeln!(out, "Seed: {}  Win chance policy: {}", self.seed, c.win_chance_policy)?;
        writeln!(out)?;
        out.push_str(&regime_table(&self.regimes)?);

        let f = &self.final_balances;
        writeln!(out)?;
        writeln!(out, "FINAL BALANCE DISTRIBUTION")?;
        writeln!(out, "{}", "-".repeat(78))?;
        writeln!(out, "Mean:               ${:.2}", f.mean)?;
        writeln!(out, "Median:             ${:.2}", f.median)?;
        writeln!(out, "Std Dev:            ${:.2}", f.std_dev)?;
        writeln!(out, "5th Percentile:     ${:.2}", f.percentile_5)?;
        writeln!(out, "95th Percentile:    ${:.2}", f.percentile_95)?;
        writeln!(out, "Worst Game:         ${:.2}", f.min)?;
        writeln!(out, "Best Game:          ${:.2}", f.max)?;
        writeln!(out, "Profitable Games:   {:.2}%", f.pct_profitable)?;
        writeln!(out, "Losing Games:       {:.2}%", f.pct_losing)?;
        if let Some(last) = self.average_curve.last() {
            writeln!(out, "Average Equity End: ${:.2}", last)?;
        }
        writeln!(out, "{}", rule)?;
        Ok(out)
    }
}

/// Fixed-width table of regime rows, widths fitted to the content
pub fn regime_table(rows: &[RegimeSummary]) -> Result<String, fmt::Error> {
    let cells: Vec<[String; 6]> = rows.iter().map(row_cells).collect();
    let widths: Vec<usize> = (0..TABLE_HEADERS.len())
        .map(|col| {
            cells
                .iter()
                .map(|row| row[col].len())
                .chain(std::iter::once(TABLE_HEADERS[col].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    writeln!(out, "{}", format_line(TABLE_HEADERS.iter().copied(), &widths))?;
    writeln!(out, "{}", widths.iter().map(|w| "-".repeat(*w)).join("-+-"))?;
    for row in &cells {
        writeln!(out, "{}", format_line(row.iter().map(String::as_str), &widths))?;
    }
    Ok(out)
}

/// First column left-aligned, numbers right-aligned
fn format_line<'a>(values: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    values
        .zip(widths)
        .enumerate()
        .map(|(col, (value, width))| {
            if col == 0 {
                format!("{:<width$}", value, width = *width)
            } else {
                format!("{:>width$}", value, width = *width)
            }
        })
        .join(" | ")
}

fn row_cells(row: &RegimeSummary) -> [String; 6] {
    [
        row.regime.clone(),
        row.total_trades.to_string(),
        row.wins.to_string(),
        row.losses.to_string(),
        format!("{:.2}", row.win_rate_pct),
        format!("{:.2}", row.net_pnl),
    ]
}

/// Regime rows as CSV with the table headers
pub fn write_csv<W: io::Write>(rows: &[RegimeSummary], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(TABLE_HEADERS)?;
    for row in rows {
        wtr.write_record(row_cells(row))?;
    }
    wtr.flush()?;
    Ok(())
}
