use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::mpsc;

use courtgrid_engine::{
    CapacityCurve, CapacityOptions, CapacityStats, ChangeEvent, CourtCatalog, CourtRef, DayId,
    Engine, Mutation, MutationResult, RailSegment,
};

use crate::config::Config;

/// A venue day to replay: the court catalog plus mutations in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub day: DayId,
    pub courts: Vec<CourtRef>,
    #[serde(default)]
    pub mutations: Vec<Mutation>,
    /// Overrides the engine's default downgrade policy.
    #[serde(default)]
    pub allow_downgrade: Option<bool>,
}

/// Rail of one court.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtRail {
    pub court: CourtRef,
    pub segments: Vec<RailSegment>,
}

/// Everything the engine derived after replaying a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub day: DayId,
    pub results: Vec<MutationResult>,
    pub events: Vec<ChangeEvent>,
    pub rails: Vec<CourtRail>,
    pub capacity: CapacityCurve,
    pub stats: CapacityStats,
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid engine configuration: {0}")]
    Config(#[from] courtgrid_engine::ConfigError),
}

pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let raw = std::fs::read_to_string(path)?;
    let scenario = serde_json::from_str(&raw)?;
    Ok(scenario)
}

/// Build an engine for the scenario, apply its mutations, and report the
/// resulting views of the scenario day.
pub fn run_scenario(scenario: &Scenario, config: &Config) -> Result<Report, ScenarioError> {
    let mut engine_config = config.engine_config();
    if let Some(allow) = scenario.allow_downgrade {
        engine_config = engine_config.with_allow_downgrade(allow);
    }
    let catalog = CourtCatalog::new(scenario.courts.iter().cloned())?;
    let mut engine = Engine::new(engine_config, catalog)?;

    let (sink, events) = mpsc::channel();
    let subscription = engine.subscribe(move |event: &ChangeEvent| {
        let _ = sink.send(event.clone());
    });

    let results: Vec<MutationResult> = scenario
        .mutations
        .iter()
        .map(|mutation| engine.apply_mutation(mutation))
        .collect();
    engine.unsubscribe(subscription);

    let applied = results.iter().filter(|r| r.applied).count();
    tracing::info!(
        "Replayed {} mutations on {} ({} applied)",
        results.len(),
        scenario.day,
        applied
    );

    let rails = engine
        .catalog()
        .iter()
        .map(|court| CourtRail {
            court: court.clone(),
            segments: engine.get_rail_segments(court, scenario.day),
        })
        .collect();
    let options = CapacityOptions {
        mode: config.capacity_mode,
        ..CapacityOptions::default()
    };
    let capacity = engine.get_capacity_curve(scenario.day, &options);
    let stats = engine.get_capacity_stats(scenario.day);

    let events = events.try_iter().collect();
    Ok(Report {
        day: scenario.day,
        results,
        events,
        rails,
        capacity,
        stats,
    })
}
