pub mod config;
pub mod scenario;

pub use config::{Config, ConfigError};
pub use scenario::{load_scenario, run_scenario, CourtRail, Report, Scenario, ScenarioError};
