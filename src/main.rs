use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courtgrid::{load_scenario, run_scenario, Config};

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Required: COURTGRID_SCENARIO (path to scenario JSON)");
            eprintln!("Optional: COURTGRID_DAY_START (default: 08:00)");
            eprintln!("Optional: COURTGRID_DAY_END (default: 20:00)");
            eprintln!("Optional: COURTGRID_SLOT_MINUTES (default: 15)");
            eprintln!("Optional: COURTGRID_CAPACITY_MODE (exact|sampled, default: exact)");
            std::process::exit(1);
        }
    };

    tracing::info!("Scenario: {}", config.scenario_path.display());
    tracing::info!(
        "Day bounds: {}-{}, slot {} minutes",
        config.day_start,
        config.day_end,
        config.slot_minutes
    );

    let scenario = match load_scenario(&config.scenario_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let report = match run_scenario(&scenario, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize report: {}", e);
            std::process::exit(1);
        }
    }
}
