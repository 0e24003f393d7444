//! Instruments command implementation

use anyhow::Result;

pub fn run(config_path: Option<String>) -> Result<()> {
    let config = super::load_config(config_path.as_deref())?;

    println!("{:<6} NAME", "KEY");
    for instrument in &config.instruments {
        println!("{:<6} {}", instrument.key, instrument.name);
    }

    Ok(())
}
