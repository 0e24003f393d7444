//! Validate command implementation

use anyhow::{Context, Result};
use regime_monte_carlo::regime::RegimeSet;
use tracing::info;

pub fn run(config_path: String) -> Result<()> {
    let config = super::load_config(Some(&config_path))?;

    let regimes = RegimeSet::from_config(&config.simulation)
        .with_context(|| format!("{} is not a valid configuration", config_path))?;

    let sim = &config.simulation;
    info!(
        "Configuration valid: {} games x {} trades, {} regimes",
        sim.game_count,
        sim.trades_per_game,
        regimes.len()
    );

    println!("{} is valid", config_path);
    println!("Total trades:       {}", sim.total_trades());
    println!("Win chance policy:  {}", sim.win_chance_policy);
    for (regime, adjustment) in regimes.regimes().iter().zip(regimes.adjustments()) {
        let chance = sim
            .win_chance_policy
            .win_chance(sim.base_win_rate, *adjustment);
        println!("  {:<16} win chance {:.2}%", regime.as_str(), chance * 100.0);
    }

    Ok(())
}
