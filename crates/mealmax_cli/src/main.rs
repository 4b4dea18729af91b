//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open a kitchen from `MEALMAX_*` environment variables.
//! - Report linkage, version and database health in a stable format.

use mealmax_core::{Kitchen, KitchenConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("mealmax_core ping={}", mealmax_core::ping());
    println!("mealmax_core version={}", mealmax_core::core_version());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("mealmax error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = KitchenConfig::from_env().map_err(|err| err.to_string())?;
    let logging = config.init_logging()?;
    println!("mealmax logging={}", if logging { "file" } else { "off" });

    let kitchen = Kitchen::open(&config).map_err(|err| err.to_string())?;
    kitchen.db_check().map_err(|err| err.to_string())?;
    let live = kitchen.list_active().map_err(|err| err.to_string())?;

    println!(
        "mealmax database={} loss_policy={} live_meals={}",
        config
            .db_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string()),
        kitchen.loss_policy().as_str(),
        live.len()
    );
    Ok(())
}
