//! Subcommand implementations

pub mod instruments;
pub mod simulate;
pub mod validate;

use anyhow::Result;
use regime_monte_carlo::Config;
use tracing::info;

/// Load the config file, or fall back to the built-in defaults
fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => {
            let config = Config::from_file(path)?;
            info!("Loaded configuration from: {}", path);
            Ok(config)
        }
        None => {
            info!("No config file given, using built-in defaults");
            Ok(Config::default())
        }
    }
}
