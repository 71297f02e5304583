use std::path::PathBuf;

use courtgrid_engine::{CapacityMode, EngineConfig, TimeOfDay};

/// CLI configuration from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub scenario_path: PathBuf,
    pub day_start: TimeOfDay,
    pub day_end: TimeOfDay,
    pub slot_minutes: u16,
    pub capacity_mode: CapacityMode,
}

impl Config {
    /// Load configuration from environment variables.
    /// COURTGRID_SCENARIO is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let scenario_path = lookup("COURTGRID_SCENARIO")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("COURTGRID_SCENARIO"))?
            .into();

        let day_start = lookup("COURTGRID_DAY_START")
            .unwrap_or_else(|| "08:00".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("COURTGRID_DAY_START", "must be HH:MM"))?;

        let day_end = lookup("COURTGRID_DAY_END")
            .unwrap_or_else(|| "20:00".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("COURTGRID_DAY_END", "must be HH:MM"))?;

        let slot_minutes = lookup("COURTGRID_SLOT_MINUTES")
            .unwrap_or_else(|| "15".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("COURTGRID_SLOT_MINUTES", "must be a positive integer")
            })?;

        let capacity_mode = match lookup("COURTGRID_CAPACITY_MODE").as_deref() {
            None | Some("exact") => CapacityMode::Exact,
            Some("sampled") => CapacityMode::Sampled,
            Some(_) => {
                return Err(ConfigError::Invalid(
                    "COURTGRID_CAPACITY_MODE",
                    "must be exact or sampled",
                ))
            }
        };

        Ok(Config {
            scenario_path,
            day_start,
            day_end,
            slot_minutes,
            capacity_mode,
        })
    }

    /// Engine configuration with the bounds and slot size from the environment.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_day_bounds(self.day_start, self.day_end)
            .with_slot_minutes(self.slot_minutes)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, &'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "Missing required variable {}", var),
            ConfigError::Invalid(var, msg) => write!(f, "Invalid value for {}: {}", var, msg),
        }
    }
}

impl std::error::Error for ConfigError {}
