//! Regime Monte Carlo - main entry point
//!
//! This binary provides three subcommands:
//! - simulate: Run the Monte Carlo simulation and print a report
//! - instruments: List the configured instruments
//! - validate: Check a configuration file without running it

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "regime-monte-carlo")]
#[command(about = "Monte Carlo simulation of trading outcomes across market regimes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the simulation
    Simulate {
        /// Path to configuration file (built-in defaults when omitted)
        #[arg(short, long, env = "MC_CONFIG")]
        config: Option<String>,

        /// Instrument to label the run with, by key or name
        #[arg(short, long, default_value = "1")]
        instrument: String,

        /// Random seed (overrides config; fresh entropy when unset)
        #[arg(long, env = "MC_SEED")]
        seed: Option<u64>,

        /// Starting balance
        #[arg(long)]
        balance: Option<f64>,

        /// Amount risked (and lost) per trade
        #[arg(long)]
        risk: Option<f64>,

        /// Reward-to-risk ratio
        #[arg(long)]
        reward_to_risk: Option<f64>,

        /// Base win rate, e.g. 0.55
        #[arg(long)]
        win_rate: Option<f64>,

        /// Trades per game
        #[arg(long)]
        trades: Option<usize>,

        /// Number of games
        #[arg(long)]
        games: Option<usize>,

        /// Win chance policy (strict or clamp)
        #[arg(long)]
        policy: Option<String>,

        /// Output format (table, csv or json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// List configured instruments
    Instruments {
        /// Path to configuration file (built-in defaults when omitted)
        #[arg(short, long, env = "MC_CONFIG")]
        config: Option<String>,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, env = "MC_CONFIG", default_value = "configs/default.json")]
        config: String,
    },
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Create log file with naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if file_only {
        // Keep the console clean for the progress bar and the report
        let file_appender = tracing_appender::rolling::never("logs", &log_filename);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        let file_appender = tracing_appender::rolling::never("logs", &log_filename);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();
    }

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let (command_name, file_only) = match &cli.command {
        Commands::Simulate { .. } => ("simulate", true),
        Commands::Instruments { .. } => ("instruments", false),
        Commands::Validate { .. } => ("validate", false),
    };

    setup_logging(cli.verbose, command_name, file_only)?;

    match cli.command {
        Commands::Simulate {
            config,
            instrument,
            seed,
            balance,
            risk,
            reward_to_risk,
            win_rate,
            trades,
            games,
            policy,
            format,
            no_progress,
        } => commands::simulate::run(commands::simulate::SimulateArgs {
            config_path: config,
            instrument,
            seed,
            balance,
            risk,
            reward_to_risk,
            win_rate,
            trades,
            games,
            policy,
            format,
            progress: !no_progress,
        }),

        Commands::Instruments { config } => commands::instruments::run(config),

        Commands::Validate { config } => commands::validate::run(config),
    }
}
