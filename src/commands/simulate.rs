//! Simulate command implementation

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use regime_monte_carlo::random::{entropy_seed, RngSource};
use regime_monte_carlo::report::{OutputFormat, SimulationReport};
use regime_monte_carlo::{Simulator, WinChancePolicy};
use tracing::{debug, info};

/// Command-line inputs for a simulation run
#[derive(Debug)]
pub struct SimulateArgs {
    pub config_path: Option<String>,
    pub instrument: String,
    pub seed: Option<u64>,
    pub balance: Option<f64>,
    pub risk: Option<f64>,
    pub reward_to_risk: Option<f64>,
    pub win_rate: Option<f64>,
    pub trades: Option<usize>,
    pub games: Option<usize>,
    pub policy: Option<String>,
    pub format: String,
    pub progress: bool,
}

pub fn run(args: SimulateArgs) -> Result<()> {
    info!("Starting simulation");

    let mut config = super::load_config(args.config_path.as_deref())?;
    let format: OutputFormat = args.format.parse().map_err(anyhow::Error::msg)?;

    // Apply overrides
    let sim = &mut config.simulation;
    if let Some(balance) = args.balance {
        info!("Overriding starting balance to: ${:.2}", balance);
        sim.starting_balance = balance;
    }
    if let Some(risk) = args.risk {
        info!("Overriding risk per trade to: ${:.2}", risk);
        sim.risk_per_trade = risk;
    }
    if let Some(rr) = args.reward_to_risk {
        info!("Overriding reward-to-risk to: {:.2}", rr);
        sim.reward_to_risk = rr;
    }
    if let Some(win_rate) = args.win_rate {
        info!("Overriding base win rate to: {:.4}", win_rate);
        sim.base_win_rate = win_rate;
    }
    if let Some(trades) = args.trades {
        info!("Overriding trades per game to: {}", trades);
        sim.trades_per_game = trades;
    }
    if let Some(games) = args.games {
        info!("Overriding game count to: {}", games);
        sim.game_count = games;
    }
    if let Some(policy) = args.policy {
        let policy: WinChancePolicy = policy.parse().map_err(anyhow::Error::msg)?;
        info!("Overriding win chance policy to: {}", policy);
        sim.win_chance_policy = policy;
    }

    let seed = args.seed.or(sim.seed).unwrap_or_else(entropy_seed);
    sim.seed = Some(seed);
    info!("Seed: {} (pass --seed {} to reproduce this run)", seed, seed);

    let instrument = config.select_instrument(&args.instrument)?.clone();
    info!("Instrument: {}", instrument.name);
    debug!("Simulation config: {:?}", config.simulation);

    let simulator = Simulator::new(&config.simulation)?;
    let mut rng = RngSource::seeded(seed);

    let result = if args.progress {
        let progress = ProgressBar::new(config.simulation.game_count as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{percent:>3}%|{bar:40}| {pos}/{len} games [{elapsed}<{eta}]")?
                .progress_chars("█░ "),
        );
        simulator.run_with_progress(&mut rng, &progress)?
    } else {
        simulator.run(&mut rng)?
    };

    info!(
        "Simulated {} games, {} trades",
        result.game_count(),
        result.regime_stats.total_trades()
    );

    let report = SimulationReport::new(instrument, seed, config.simulation.clone(), &result);
    println!("{}", report.render(format)?);

    info!("Simulation completed successfully");

    Ok(())
}
