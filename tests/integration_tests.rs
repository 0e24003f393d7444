//! Integration tests for the regime Monte Carlo simulator
//!
//! These tests drive the public API end to end: configuration, engine,
//! summaries and reports.

use approx::assert_relative_eq;
use rust_decimal_macros::dec;

use regime_monte_carlo::report::{OutputFormat, SimulationReport};
use regime_monte_carlo::stats::{summarize, FinalBalanceStats};
use regime_monte_carlo::{
    run_simulation, Config, ConfigError, Money, RegimeConfig, RngSource, ScriptedSource,
    SimulationConfig, SimulationError, Simulator, WinChancePolicy,
};

// =============================================================================
// Test Utilities
// =============================================================================

fn config_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("configs")
        .join(name)
}

/// Config whose every trade has a certain outcome
fn certain_config(base_win_rate: f64, trades_per_game: usize, game_count: usize) -> SimulationConfig {
    SimulationConfig {
        base_win_rate,
        trades_per_game,
        game_count,
        win_chance_policy: WinChancePolicy::Clamp,
        ..SimulationConfig::default()
    }
}

/// Checks every structural guarantee of a finished run
fn assert_run_invariants(config: &SimulationConfig, seed: u64) {
    let simulator = Simulator::new(config).unwrap();
    let result = simulator.run(&mut RngSource::seeded(seed)).unwrap();

    assert_eq!(result.equity_curves.len(), config.game_count);
    let start = Money::from_f64(config.starting_balance);
    for curve in &result.equity_curves {
        assert_eq!(curve.len(), config.trades_per_game + 1);
        assert_eq!(curve[0], start);
        for pair in curve.windows(2) {
            let step = pair[1] - pair[0];
            assert!(
                step == simulator.win_amount() || step == -simulator.loss_amount(),
                "step {} is neither a win nor a loss",
                step
            );
        }
    }

    assert_eq!(
        result.regime_stats.total_trades(),
        (config.game_count * config.trades_per_game) as u64
    );
    for stats in &result.regime_stats {
        assert_eq!(stats.trades, stats.wins + stats.losses);
        assert_eq!(
            stats.net_pnl,
            Money::from_count(stats.wins) * simulator.win_amount()
                - Money::from_count(stats.losses) * simulator.loss_amount()
        );
    }
}

// =============================================================================
// Engine Guarantees
// =============================================================================

#[test]
fn test_invariants_hold_for_default_config() {
    assert_run_invariants(&SimulationConfig::default(), 42);
}

#[test]
fn test_invariants_hold_for_fractional_amounts() {
    let config = SimulationConfig {
        starting_balance: 250.75,
        risk_per_trade: 0.37,
        reward_to_risk: 1.85,
        base_win_rate: 0.4,
        trades_per_game: 250,
        game_count: 40,
        regimes: vec![
            RegimeConfig::new("trend", 0.15),
            RegimeConfig::new("range", 0.0),
            RegimeConfig::new("news", -0.2),
        ],
        ..SimulationConfig::default()
    };
    for seed in [1, 2, 3] {
        assert_run_invariants(&config, seed);
    }
}

#[test]
fn test_forced_win_example() {
    let config = SimulationConfig {
        starting_balance: 1000.0,
        risk_per_trade: 1.0,
        reward_to_risk: 2.0,
        ..certain_config(1.0, 1, 1)
    };
    let expected = vec![vec![Money::from(dec!(1000)), Money::from(dec!(1002))]];

    for seed in 0..50 {
        let result = run_simulation(&config, &mut RngSource::seeded(seed)).unwrap();
        assert_eq!(result.equity_curves, expected);
    }

    // Highest possible draw in the weakest regime
    let mut rng = ScriptedSource::new([0.999_999], [3]);
    let result = run_simulation(&config, &mut rng).unwrap();
    assert_eq!(result.equity_curves, expected);
}

#[test]
fn test_out_of_range_amounts_rejected_up_front() {
    let cases = [
        (1000.0, 1e20, 1e10),
        (7e28, 1e28, 2.0),
        (1000.0, 1e-30, 2.0),
    ];
    for (starting_balance, risk_per_trade, reward_to_risk) in cases {
        let config = SimulationConfig {
            starting_balance,
            risk_per_trade,
            reward_to_risk,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(matches!(
            Simulator::new(&config),
            Err(SimulationError::InvalidConfig(_))
        ));
    }
}

#[test]
fn test_all_wins_strictly_increase() {
    let config = certain_config(1.0, 30, 5);
    let result = run_simulation(&config, &mut RngSource::seeded(9)).unwrap();
    for curve in &result.equity_curves {
        for pair in curve.windows(2) {
            assert_eq!(pair[1] - pair[0], Money::from(dec!(2)));
        }
    }
    assert_eq!(result.regime_stats.total_wins(), 150);
}

#[test]
fn test_all_losses_strictly_decrease() {
    let config = certain_config(0.0, 30, 5);
    let result = run_simulation(&config, &mut RngSource::seeded(9)).unwrap();
    for curve in &result.equity_curves {
        for pair in curve.windows(2) {
            assert_eq!(pair[0] - pair[1], Money::from(dec!(1)));
        }
        assert_eq!(*curve.last().unwrap(), Money::from(dec!(970)));
    }
    assert_eq!(result.regime_stats.total_wins(), 0);
}

#[test]
fn test_same_seed_same_result() {
    let config = SimulationConfig::default();
    let a = run_simulation(&config, &mut RngSource::seeded(1234)).unwrap();
    let b = run_simulation(&config, &mut RngSource::seeded(1234)).unwrap();
    assert_eq!(a, b);

    let c = run_simulation(&config, &mut RngSource::seeded(4321)).unwrap();
    assert_ne!(a.equity_curves, c.equity_curves);
}

#[test]
fn test_regime_win_rates_follow_adjustments() {
    let config = SimulationConfig::default();
    let result = run_simulation(&config, &mut RngSource::seeded(77)).unwrap();

    let expected = [
        ("ideal setup", 0.65),
        ("bullish trend", 0.60),
        ("bearish trend", 0.50),
        ("choppy", 0.45),
    ];
    for (regime, chance) in expected {
        let stats = result.regime_stats.get(regime).unwrap();
        // Uniform sampling: each of four regimes sees about a quarter of 50k trades
        assert!(stats.trades > 11_000 && stats.trades < 14_000);
        let observed = stats.wins as f64 / stats.trades as f64;
        assert!(
            (observed - chance).abs() < 0.02,
            "{}: observed {} expected {}",
            regime,
            observed,
            chance
        );
    }
}

// =============================================================================
// Failure Handling
// =============================================================================

#[test]
fn test_malformed_configs_rejected() {
    let cases = vec![
        SimulationConfig {
            trades_per_game: 0,
            ..SimulationConfig::default()
        },
        SimulationConfig {
            game_count: 0,
            ..SimulationConfig::default()
        },
        SimulationConfig {
            risk_per_trade: -1.0,
            ..SimulationConfig::default()
        },
        SimulationConfig {
            reward_to_risk: 0.0,
            ..SimulationConfig::default()
        },
        SimulationConfig {
            base_win_rate: 0.92,
            ..SimulationConfig::default()
        },
        SimulationConfig {
            base_win_rate: f64::NAN,
            ..SimulationConfig::default()
        },
    ];

    for config in cases {
        let mut rng = ScriptedSource::new([0.5], [0]);
        let err = run_simulation(&config, &mut rng).unwrap_err();
        assert!(
            matches!(err, SimulationError::InvalidConfig(_)),
            "unexpected error {:?}",
            err
        );
        // Nothing was drawn
        assert_eq!(rng.remaining(), (1, 1));
    }
}

#[test]
fn test_source_failure_returns_no_partial_result() {
    let config = SimulationConfig {
        trades_per_game: 5,
        game_count: 3,
        ..SimulationConfig::default()
    };
    // Enough for two games only
    let mut rng = ScriptedSource::new(vec![0.3; 10], vec![1; 15]);
    assert!(matches!(
        run_simulation(&config, &mut rng),
        Err(SimulationError::RandomSource(_))
    ));
}

// =============================================================================
// Summaries and Reports
// =============================================================================

#[test]
fn test_zero_trade_regimes_summarize_to_zero() {
    let config = SimulationConfig {
        trades_per_game: 2,
        game_count: 1,
        ..SimulationConfig::default()
    };
    let mut rng = ScriptedSource::new([0.2, 0.2], [1, 1]);
    let result = run_simulation(&config, &mut rng).unwrap();
    let rows = summarize(&result.regime_stats);

    let bullish = rows.iter().find(|r| r.regime == "bullish trend").unwrap();
    assert_eq!((bullish.total_trades, bullish.wins), (2, 2));
    assert_relative_eq!(bullish.win_rate_pct, 100.0);
    assert_eq!(bullish.net_pnl, Money::from(dec!(4.00)));

    for row in rows.iter().filter(|r| r.regime != "bullish trend") {
        assert_eq!(row.total_trades, 0);
        assert_eq!(row.win_rate_pct, 0.0);
        assert!(!row.win_rate_pct.is_nan());
    }
}

#[test]
fn test_final_balance_stats_bracket_outcomes() {
    let config = SimulationConfig::default();
    let result = run_simulation(&config, &mut RngSource::seeded(5)).unwrap();
    let stats = FinalBalanceStats::from_result(&result, Money::from(dec!(1000)));

    assert_eq!(stats.games, 500);
    assert!(stats.min <= stats.percentile_5);
    assert!(stats.percentile_5 <= stats.median);
    assert!(stats.median <= stats.percentile_95);
    assert!(stats.percentile_95 <= stats.max);
    // Positive expectancy: 0.55 * 2 - 0.45 = 0.65 per trade
    assert!(stats.mean > 1040.0 && stats.mean < 1090.0);
    assert_relative_eq!(
        stats.mean,
        *result.average_curve().last().unwrap(),
        epsilon = 1e-6
    );
}

#[test]
fn test_instrument_does_not_change_outcome() {
    let app = Config::default();
    let sim = app.simulation.clone();
    let btc = app.select_instrument("BTC/USDT").unwrap().clone();
    let spy = app.select_instrument("4").unwrap().clone();

    let a = run_simulation(&sim, &mut RngSource::seeded(8)).unwrap();
    let b = run_simulation(&sim, &mut RngSource::seeded(8)).unwrap();

    let report_a = SimulationReport::new(btc, 8, sim.clone(), &a);
    let report_b = SimulationReport::new(spy, 8, sim, &b);
    assert_eq!(report_a.regimes, report_b.regimes);
    assert_eq!(report_a.average_curve, report_b.average_curve);
    assert_ne!(report_a.instrument, report_b.instrument);
}

#[test]
fn test_report_renders_every_format() {
    let config = SimulationConfig {
        trades_per_game: 10,
        game_count: 10,
        ..SimulationConfig::default()
    };
    let result = run_simulation(&config, &mut RngSource::seeded(3)).unwrap();
    let report = SimulationReport::new(
        Config::default().instruments[2].clone(),
        3,
        config,
        &result,
    );

    let table = report.render(OutputFormat::Table).unwrap();
    assert!(table.contains("SOL/USDT"));
    assert!(table.contains("Win Rate (%)"));

    let csv = report.render(OutputFormat::Csv).unwrap();
    assert_eq!(csv.lines().count(), 5);

    let json: serde_json::Value =
        serde_json::from_str(&report.render(OutputFormat::Json).unwrap()).unwrap();
    assert_eq!(json["instrument"]["name"], "SOL/USDT");
    assert_eq!(json["average_curve"].as_array().unwrap().len(), 11);
}

// =============================================================================
// Configuration Files
// =============================================================================

#[test]
fn test_default_config_file_matches_builtin_defaults() {
    let config = Config::from_file(config_path("default.json")).unwrap();
    assert_eq!(config.simulation, SimulationConfig::default());
    assert_eq!(config.instruments, Config::default().instruments);
    assert!(config.simulation.validate().is_ok());
}

#[test]
fn test_certain_outcomes_config_file_runs() {
    let config = Config::from_file(config_path("certain_outcomes.json")).unwrap();
    assert_eq!(config.simulation.win_chance_policy, WinChancePolicy::Clamp);

    let result = run_simulation(&config.simulation, &mut RngSource::seeded(1)).unwrap();
    for curve in &result.equity_curves {
        assert_eq!(*curve.last().unwrap(), Money::from(dec!(1100)));
    }
}

#[test]
fn test_missing_config_file_is_an_error() {
    assert!(Config::from_file(config_path("does_not_exist.json")).is_err());
}

#[test]
fn test_unknown_instrument_is_an_error() {
    let config = Config::default();
    assert!(matches!(
        config.select_instrument("DOGE/USDT"),
        Err(ConfigError::UnknownInstrument { .. })
    ));
}
