use std::io::Write;
use std::sync::{Arc, Mutex};

use courtgrid::{load_scenario, run_scenario, Config, Scenario};
use courtgrid_engine::{
    ApplyBlockOptions, BlockId, BlockType, CapacityMode, CapacityOptions, ChangeEvent,
    CourtCatalog, CourtRef, DayId, Engine, EngineConfig, MoveBlockOptions, MutationError,
    RailSegment, TimeOfDay, TimeRange, ValidationError,
};

fn t(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

fn r(start: &str, end: &str) -> TimeRange {
    TimeRange::new(t(start), t(end))
}

fn day() -> DayId {
    DayId::from_ymd_opt(2026, 6, 1).unwrap()
}

fn court_a() -> CourtRef {
    CourtRef::new("club", "A")
}

fn court_b() -> CourtRef {
    CourtRef::new("club", "B")
}

/// Engine with 08:00-20:00 day bounds and 15 minute slots.
fn create_engine(courts: Vec<CourtRef>) -> Engine {
    let config = EngineConfig::default()
        .with_day_bounds(t("08:00"), t("20:00"))
        .with_slot_minutes(15);
    Engine::new(config, CourtCatalog::new(courts).unwrap()).unwrap()
}

fn segment(start: &str, end: &str, status: BlockType) -> (TimeRange, BlockType) {
    (r(start, end), status)
}

/// Rail reduced to (range, status) pairs.
fn shape(rail: &[RailSegment]) -> Vec<(TimeRange, BlockType)> {
    rail.iter().map(|s| (s.range(), s.status)).collect()
}

fn hard_block(court: CourtRef, start: &str, end: &str) -> ApplyBlockOptions {
    ApplyBlockOptions::new(court, day(), r(start, end), BlockType::HardBlock)
}

// ============================================================================
// Rail scenarios
// ============================================================================

#[test]
fn test_empty_court_is_one_available_segment() {
    let engine = create_engine(vec![court_a()]);

    let rail = engine.get_rail_segments(&court_a(), day());
    assert_eq!(
        shape(&rail),
        vec![segment("08:00", "20:00", BlockType::Available)]
    );
    assert!(rail[0].contributing_block_ids.is_empty());
}

#[test]
fn test_hard_block_splits_rail() {
    let mut engine = create_engine(vec![court_a()]);
    let result = engine.apply_block(hard_block(court_a(), "09:00", "10:00"));
    assert!(result.applied);

    let rail = engine.get_rail_segments(&court_a(), day());
    assert_eq!(
        shape(&rail),
        vec![
            segment("08:00", "09:00", BlockType::Available),
            segment("09:00", "10:00", BlockType::HardBlock),
            segment("10:00", "20:00", BlockType::Available),
        ]
    );
    assert_eq!(rail[1].contributing_block_ids, result.block_ids);
}

#[test]
fn test_soft_block_under_hard_block_only_contributes() {
    let mut engine = create_engine(vec![court_a()]);
    let hard = engine.apply_block(hard_block(court_a(), "09:00", "10:00"));
    let soft = engine.apply_block(ApplyBlockOptions::new(
        court_a(),
        day(),
        r("09:30", "09:45"),
        BlockType::SoftBlock,
    ));

    assert!(soft.applied);
    assert_eq!(soft.warnings.len(), 1);
    assert!(soft.conflicts.is_empty());

    let rail = engine.get_rail_segments(&court_a(), day());
    assert_eq!(
        shape(&rail),
        vec![
            segment("08:00", "09:00", BlockType::Available),
            segment("09:00", "10:00", BlockType::HardBlock),
            segment("10:00", "20:00", BlockType::Available),
        ]
    );
    assert_eq!(
        rail[1].contributing_block_ids,
        vec![hard.block_ids[0], soft.block_ids[0]]
    );
}

// ============================================================================
// Capacity scenarios
// ============================================================================

#[test]
fn test_capacity_counts_one_blocked_court() {
    let mut engine = create_engine(vec![court_a(), court_b()]);
    engine.apply_block(hard_block(court_a(), "09:00", "10:00"));

    let curve = engine.get_capacity_curve(day(), &CapacityOptions::default());
    let point = curve.point_at(t("09:30")).unwrap();

    assert_eq!(curve.total_courts, 2);
    assert_eq!(point.available, 1);
    assert_eq!(point.hard_blocked, 1);
    assert_eq!(point.soft_blocked, 0);
}

#[test]
fn test_move_block_frees_old_interval() {
    let mut engine = create_engine(vec![court_a(), court_b()]);
    let added = engine.apply_block(hard_block(court_a(), "09:00", "10:00"));
    let id = added.block_ids[0];

    let moved = engine.move_block(MoveBlockOptions::new(id, r("11:00", "12:00")));
    assert!(moved.applied);
    assert_eq!(moved.block_ids, vec![id]);

    let rail = engine.get_rail_segments(&court_a(), day());
    assert_eq!(
        shape(&rail),
        vec![
            segment("08:00", "11:00", BlockType::Available),
            segment("11:00", "12:00", BlockType::HardBlock),
            segment("12:00", "20:00", BlockType::Available),
        ]
    );

    let curve = engine.get_capacity_curve(day(), &CapacityOptions::default());
    assert_eq!(curve.point_at(t("09:30")).unwrap().available, 2);
    assert_eq!(curve.point_at(t("11:30")).unwrap().available, 1);
}

#[test]
fn test_sampled_capacity_reports_slot_grid() {
    let mut engine = create_engine(vec![court_a(), court_b()]);
    engine.apply_block(hard_block(court_a(), "09:05", "09:10"));

    let exact = engine.get_capacity_curve(day(), &CapacityOptions::default());
    assert_eq!(exact.point_at(t("09:07")).unwrap().hard_blocked, 1);

    let sampled = engine.get_capacity_curve(day(), &CapacityOptions::sampled());
    assert_eq!(sampled.mode, CapacityMode::Sampled);
    assert!(sampled.points.iter().all(|p| p.hard_blocked == 0));
}

// ============================================================================
// Not-found and boundary behavior
// ============================================================================

#[test]
fn test_remove_twice_reports_not_found_without_event() {
    let mut engine = create_engine(vec![court_a()]);
    let added = engine.apply_block(hard_block(court_a(), "09:00", "10:00"));
    let id = added.block_ids[0];

    let events: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    engine.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    assert!(engine.remove_block(id).applied);
    let rail_after_first = engine.get_rail_segments(&court_a(), day());
    let blocks_after_first = engine.blocks();

    let second = engine.remove_block(id);
    assert!(!second.applied);
    assert!(second.is_not_found());
    assert_eq!(second.errors, vec![MutationError::BlockNotFound(id)]);

    assert_eq!(events.lock().unwrap().len(), 1);
    assert_eq!(engine.blocks(), blocks_after_first);
    assert_eq!(engine.get_rail_segments(&court_a(), day()), rail_after_first);
}

#[test]
fn test_full_day_block() {
    let mut engine = create_engine(vec![court_a()]);
    engine.apply_block(ApplyBlockOptions::new(
        court_a(),
        day(),
        r("08:00", "20:00"),
        BlockType::Closed,
    ));

    let rail = engine.get_rail_segments(&court_a(), day());
    assert_eq!(shape(&rail), vec![segment("08:00", "20:00", BlockType::Closed)]);
}

#[test]
fn test_zero_length_interval_rejected() {
    let mut engine = create_engine(vec![court_a()]);
    let result = engine.apply_block(hard_block(court_a(), "09:00", "09:00"));

    assert!(!result.applied);
    assert!(matches!(
        result.errors[0],
        MutationError::Validation(ValidationError::InvalidInterval { .. })
    ));
    assert!(engine.blocks().is_empty());
}

#[test]
fn test_out_of_bounds_interval_rejected() {
    let mut engine = create_engine(vec![court_a()]);
    let result = engine.apply_block(hard_block(court_a(), "06:00", "07:00"));

    assert!(matches!(
        result.errors[0],
        MutationError::Validation(ValidationError::OutOfDayBounds { .. })
    ));
}

#[test]
fn test_identical_blocks_tie_break_on_id() {
    let mut engine = create_engine(vec![court_a()]);
    let first = engine.apply_block(
        ApplyBlockOptions::new(court_a(), day(), r("09:00", "10:00"), BlockType::Practice)
            .with_metadata(serde_json::json!({"label": "first"})),
    );
    let second = engine.apply_block(
        ApplyBlockOptions::new(court_a(), day(), r("09:00", "10:00"), BlockType::Practice)
            .with_metadata(serde_json::json!({"label": "second"})),
    );
    assert_eq!(second.warnings[0].existing, first.block_ids[0]);

    let rail = engine.get_rail_segments(&court_a(), day());
    assert_eq!(rail[1].status, BlockType::Practice);
    assert_eq!(
        rail[1].contributing_block_ids,
        vec![BlockId(1), BlockId(2)]
    );
}

#[test]
fn test_higher_type_covering_block_takes_interval() {
    let mut engine = create_engine(vec![court_a()]);
    engine.apply_block(ApplyBlockOptions::new(
        court_a(),
        day(),
        r("09:00", "10:00"),
        BlockType::Practice,
    ));
    let cover = engine.apply_block(ApplyBlockOptions::new(
        court_a(),
        day(),
        r("08:30", "10:30"),
        BlockType::Maintenance,
    ));
    assert!(cover.applied);

    let rail = engine.get_rail_segments(&court_a(), day());
    assert_eq!(
        shape(&rail),
        vec![
            segment("08:00", "08:30", BlockType::Available),
            segment("08:30", "10:30", BlockType::Maintenance),
            segment("10:30", "20:00", BlockType::Available),
        ]
    );
    assert_eq!(rail[1].contributing_block_ids, vec![BlockId(1), BlockId(2)]);
}

#[test]
fn test_priority_override_beats_type_rank() {
    let mut engine = create_engine(vec![court_a()]);
    engine.apply_block(hard_block(court_a(), "09:00", "10:00"));
    engine.apply_block(
        ApplyBlockOptions::new(court_a(), day(), r("09:00", "10:00"), BlockType::Reserved)
            .with_priority(50),
    );

    let rail = engine.get_rail_segments(&court_a(), day());
    assert_eq!(rail[1].status, BlockType::Reserved);
}

#[test]
fn test_engines_are_independent() {
    let mut first = create_engine(vec![court_a()]);
    let second = create_engine(vec![court_a()]);
    first.apply_block(hard_block(court_a(), "09:00", "10:00"));

    assert_ne!(first.id(), second.id());
    assert!(second.blocks().is_empty());
    assert_eq!(second.get_rail_segments(&court_a(), day()).len(), 1);
}

// ============================================================================
// Scenario files
// ============================================================================

const SCENARIO: &str = r#"{
    "day": "2026-06-01",
    "courts": [
        {"facility_id": "club", "court_id": "A"},
        {"facility_id": "club", "court_id": "B"}
    ],
    "mutations": [
        {
            "op": "apply_block",
            "court": {"facility_id": "club", "court_id": "A"},
            "day": "2026-06-01",
            "range": {"start": "09:00", "end": "10:00"},
            "block_type": "HARD_BLOCK"
        },
        {
            "op": "apply_template",
            "courts": [
                {"facility_id": "club", "court_id": "A"},
                {"facility_id": "club", "court_id": "B"}
            ],
            "days": {"type": "dates", "days": ["2026-06-01"]},
            "range": {"start": "18:00", "end": "20:00"},
            "block_type": "PRACTICE"
        },
        {"op": "remove_block", "block_id": 99}
    ]
}"#;

fn scenario_config(path: &std::path::Path) -> Config {
    Config::from_lookup(|name| match name {
        "COURTGRID_SCENARIO" => Some(path.display().to_string()),
        _ => None,
    })
    .unwrap()
}

#[test]
fn test_run_scenario_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SCENARIO.as_bytes()).unwrap();

    let config = scenario_config(file.path());
    let scenario = load_scenario(&config.scenario_path).unwrap();
    let report = run_scenario(&scenario, &config).unwrap();

    assert_eq!(report.results.len(), 3);
    assert!(report.results[0].applied);
    assert_eq!(report.results[1].block_ids, vec![BlockId(2), BlockId(3)]);
    assert!(report.results[2].is_not_found());
    assert_eq!(report.events.len(), 2);

    assert_eq!(report.rails.len(), 2);
    assert_eq!(report.rails[0].court, court_a());
    assert_eq!(report.rails[0].segments.len(), 4);
    assert_eq!(report.rails[1].segments.len(), 2);

    assert_eq!(report.stats.hard_blocked_court_minutes, 60);
    assert_eq!(report.stats.soft_blocked_court_minutes, 2 * 120);
    assert_eq!(report.capacity.point_at(t("18:30")).unwrap().soft_blocked, 2);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["rails"][0]["segments"][1]["status"], "HARD_BLOCK");
}

#[test]
fn test_scenario_with_duplicate_court_fails() {
    let scenario: Scenario = serde_json::from_str(
        r#"{
            "day": "2026-06-01",
            "courts": [
                {"facility_id": "club", "court_id": "A"},
                {"facility_id": "club", "court_id": "A"}
            ]
        }"#,
    )
    .unwrap();
    let config = scenario_config(std::path::Path::new("unused.json"));

    let err = run_scenario(&scenario, &config).unwrap_err();
    assert!(err.to_string().contains("more than once"));
}

#[test]
fn test_load_missing_scenario_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_scenario(&dir.path().join("missing.json")).unwrap_err();
    assert!(err.to_string().starts_with("Failed to read scenario"));
}
