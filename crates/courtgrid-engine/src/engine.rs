use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use courtgrid_core::{
    court_day_key, Block, BlockId, CapacityCurve, CapacityMode, ChangeEvent, ConfigError,
    CourtCatalog, CourtDayKey, CourtRef, DayId, EngineConfig, RailSegment,
};
use courtgrid_rails::{
    calculate_capacity_stats, derive_rail_segments, generate_capacity_curve, CapacityStats,
    FacilityDayTimeline,
};

use crate::cache::RailCache;
use crate::mutation::{
    ApplyBlockOptions, MoveBlockOptions, Mutation, MutationResult, ResizeBlockOptions,
    SimulationResult, TemplateOptions,
};
use crate::planner::{self, Outcome};
use crate::store::BlockStore;
use crate::subscribers::{SubscriptionId, Subscribers};

/// Parameters of a capacity query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapacityOptions {
    #[serde(default)]
    pub mode: CapacityMode,
    /// Restrict to these courts. Courts outside the catalog are ignored.
    #[serde(default)]
    pub courts: Option<Vec<CourtRef>>,
    /// Grid spacing for sampled curves; defaults to the engine's slot size.
    #[serde(default)]
    pub slot_minutes: Option<u16>,
}

impl CapacityOptions {
    pub fn sampled() -> Self {
        Self {
            mode: CapacityMode::Sampled,
            ..Self::default()
        }
    }

    pub fn for_courts(mut self, courts: Vec<CourtRef>) -> Self {
        self.courts = Some(courts);
        self
    }
}

/// The temporal grid engine for one venue.
///
/// Owns the canonical block collection. Rails and capacity are derived from
/// it on read; rails are cached per court-day and dropped whenever a
/// committed mutation touches that court-day.
#[derive(Debug)]
pub struct Engine {
    id: Uuid,
    config: EngineConfig,
    catalog: CourtCatalog,
    store: BlockStore,
    rails: RailCache,
    subscribers: Subscribers,
}

impl Engine {
    pub fn new(config: EngineConfig, catalog: CourtCatalog) -> Result<Self, ConfigError> {
        config.validate()?;
        let id = Uuid::new_v4();
        tracing::info!(
            "Created engine {} with {} courts, day {}",
            id,
            catalog.len(),
            config.day_range()
        );

        Ok(Self {
            id,
            config,
            catalog,
            store: BlockStore::new(),
            rails: RailCache::new(),
            subscribers: Subscribers::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CourtCatalog {
        &self.catalog
    }

    // Mutations

    /// Validate, check for conflicts, commit, then notify subscribers.
    ///
    /// Failures are reported inside the result; a result with
    /// `applied == false` left the engine unchanged.
    pub fn apply_mutation(&mut self, mutation: &Mutation) -> MutationResult {
        let Outcome { result, change } =
            planner::execute(&mut self.store, mutation, &self.config, &self.catalog);

        if let Some(kind) = change {
            self.rails.invalidate(&result.affected);
            let event = ChangeEvent::new(kind, result.affected.clone());
            tracing::debug!(
                "Engine {} committed change to {} court-days",
                self.id,
                event.affected.len()
            );
            self.subscribers.notify(&event);
        }
        result
    }

    pub fn apply_block(&mut self, options: ApplyBlockOptions) -> MutationResult {
        self.apply_mutation(&Mutation::ApplyBlock(options))
    }

    pub fn move_block(&mut self, options: MoveBlockOptions) -> MutationResult {
        self.apply_mutation(&Mutation::MoveBlock(options))
    }

    pub fn resize_block(&mut self, options: ResizeBlockOptions) -> MutationResult {
        self.apply_mutation(&Mutation::ResizeBlock(options))
    }

    pub fn remove_block(&mut self, block_id: BlockId) -> MutationResult {
        self.apply_mutation(&Mutation::RemoveBlock { block_id })
    }

    pub fn apply_template(&mut self, options: TemplateOptions) -> MutationResult {
        self.apply_mutation(&Mutation::ApplyTemplate(options))
    }

    /// Run a mutation against a copy of the block collection and report the
    /// rails and capacity it would produce. The engine is not changed and no
    /// subscriber is notified.
    ///
    /// Every court-day the mutation targets is reported, including when the
    /// mutation would be rejected; those views then match the current state.
    pub fn simulate(&self, mutation: &Mutation) -> SimulationResult {
        let mut targets = self.target_keys(mutation);
        let mut hypothetical = self.store.clone();
        let Outcome { result, .. } =
            planner::execute(&mut hypothetical, mutation, &self.config, &self.catalog);
        targets.extend(result.affected.iter().cloned());

        let rails = targets
            .iter()
            .map(|key| (key.clone(), self.derive_rail(&hypothetical, key)))
            .collect();

        let days: BTreeSet<DayId> = targets.iter().map(|key| key.day).collect();
        let courts: Vec<&CourtRef> = self.catalog.iter().collect();
        let capacity = days
            .into_iter()
            .map(|day| {
                let curve = self.derive_capacity(
                    &hypothetical,
                    day,
                    &courts,
                    CapacityMode::Exact,
                    self.config.slot_minutes,
                );
                (day, curve)
            })
            .collect();

        SimulationResult {
            result,
            rails,
            capacity,
        }
    }

    // Subscriptions

    /// Register a handler called after every committed mutation.
    pub fn subscribe(
        &mut self,
        handler: impl FnMut(&ChangeEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // Reads

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.store.get(id)
    }

    /// All blocks, ascending by id.
    pub fn blocks(&self) -> Vec<Block> {
        self.store.iter().cloned().collect()
    }

    pub fn blocks_for_day(&self, day: DayId) -> Vec<Block> {
        self.store.for_day(day).cloned().collect()
    }

    pub fn get_timeline(&self, court: &CourtRef, day: DayId) -> FacilityDayTimeline {
        let key = court_day_key(court, day);
        let blocks = self.store.for_court_day(&key);
        FacilityDayTimeline::collect(key.clone(), self.config.day_range(), blocks)
    }

    /// The resolved rail of one court-day. A court outside the catalog holds
    /// no blocks and gets the all-available rail.
    pub fn get_rail_segments(&self, court: &CourtRef, day: DayId) -> Vec<RailSegment> {
        let key = court_day_key(court, day);
        if !self.catalog.contains(court) {
            return self.derive_rail(&self.store, &key);
        }
        self.rails
            .get_or_derive(&key, || self.derive_rail(&self.store, &key))
    }

    pub fn get_capacity_curve(&self, day: DayId, options: &CapacityOptions) -> CapacityCurve {
        let courts: Vec<&CourtRef> = match &options.courts {
            Some(wanted) => {
                let wanted: BTreeSet<&CourtRef> = wanted.iter().collect();
                self.catalog.iter().filter(|c| wanted.contains(c)).collect()
            }
            None => self.catalog.iter().collect(),
        };
        let slot_minutes = options.slot_minutes.unwrap_or(self.config.slot_minutes);

        let rails: BTreeMap<CourtRef, Vec<RailSegment>> = courts
            .iter()
            .map(|court| ((*court).clone(), self.get_rail_segments(court, day)))
            .collect();
        generate_capacity_curve(
            day,
            &rails,
            &self.config.day_range(),
            options.mode,
            slot_minutes,
        )
    }

    /// Statistics over the exact curve of every court in the catalog.
    pub fn get_capacity_stats(&self, day: DayId) -> CapacityStats {
        calculate_capacity_stats(&self.get_capacity_curve(day, &CapacityOptions::default()))
    }

    /// Court-days a mutation reads or writes, judged against the current
    /// state. Blocks that do not exist contribute nothing.
    fn target_keys(&self, mutation: &Mutation) -> BTreeSet<CourtDayKey> {
        let existing = |id: BlockId| self.store.get(id).map(Block::key);
        match mutation {
            Mutation::ApplyBlock(opts) => [court_day_key(&opts.court, opts.day)].into(),
            Mutation::MoveBlock(opts) => match self.store.get(opts.block_id) {
                Some(block) => {
                    let court = opts.court.as_ref().unwrap_or(&block.court);
                    let day = opts.day.unwrap_or(block.day);
                    [block.key(), court_day_key(court, day)].into()
                }
                None => BTreeSet::new(),
            },
            Mutation::ResizeBlock(opts) => existing(opts.block_id).into_iter().collect(),
            Mutation::RemoveBlock { block_id } => existing(*block_id).into_iter().collect(),
            Mutation::ApplyTemplate(opts) => opts
                .placements()
                .iter()
                .map(|(court, day)| court_day_key(court, *day))
                .collect(),
        }
    }

    fn derive_rail(&self, store: &BlockStore, key: &CourtDayKey) -> Vec<RailSegment> {
        derive_rail_segments(
            store.for_court_day(key),
            &self.config.day_range(),
            &self.config.status_precedence,
        )
    }

    fn derive_capacity(
        &self,
        store: &BlockStore,
        day: DayId,
        courts: &[&CourtRef],
        mode: CapacityMode,
        slot_minutes: u16,
    ) -> CapacityCurve {
        let rails: BTreeMap<CourtRef, Vec<RailSegment>> = courts
            .iter()
            .map(|court| {
                let key = court_day_key(court, day);
                ((*court).clone(), self.derive_rail(store, &key))
            })
            .collect();
        generate_capacity_curve(day, &rails, &self.config.day_range(), mode, slot_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtgrid_core::{BlockType, ChangeKind, TimeOfDay, TimeRange};
    use std::sync::{Arc, Mutex};

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn r(start: &str, end: &str) -> TimeRange {
        TimeRange::new(t(start), t(end))
    }

    fn day() -> DayId {
        DayId::from_ymd_opt(2026, 6, 1).unwrap()
    }

    fn court(id: &str) -> CourtRef {
        CourtRef::new("club", id)
    }

    fn engine() -> Engine {
        let config = EngineConfig::default().with_day_bounds(t("08:00"), t("20:00"));
        let catalog = CourtCatalog::new(vec![court("1"), court("2"), court("3")]).unwrap();
        Engine::new(config, catalog).unwrap()
    }

    fn hard(court_id: &str, start: &str, end: &str) -> ApplyBlockOptions {
        ApplyBlockOptions::new(court(court_id), day(), r(start, end), BlockType::HardBlock)
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = EngineConfig::default().with_day_bounds(t("20:00"), t("08:00"));
        let err = Engine::new(config, CourtCatalog::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDayBounds { .. }));

        let config = EngineConfig::default().with_slot_minutes(0);
        assert_eq!(
            Engine::new(config, CourtCatalog::default()).unwrap_err(),
            ConfigError::InvalidSlotMinutes(0)
        );
    }

    #[test]
    fn test_empty_engine_is_all_available() {
        let engine = engine();
        let rail = engine.get_rail_segments(&court("1"), day());
        assert_eq!(rail.len(), 1);
        assert_eq!(rail[0].status, BlockType::Available);
        assert_eq!(rail[0].range(), r("08:00", "20:00"));

        let curve = engine.get_capacity_curve(day(), &CapacityOptions::default());
        assert_eq!(curve.points.len(), 1);
        assert_eq!(curve.points[0].available, 3);
    }

    #[test]
    fn test_mutation_invalidates_rail_cache() {
        let mut engine = engine();
        let before = engine.get_rail_segments(&court("1"), day());
        assert!(engine.rails.is_cached(&court_day_key(&court("1"), day())));

        engine.apply_block(hard("1", "09:00", "10:00"));
        assert!(!engine.rails.is_cached(&court_day_key(&court("1"), day())));

        let after = engine.get_rail_segments(&court("1"), day());
        assert_ne!(before, after);
        assert_eq!(after.len(), 3);
        assert_eq!(after[1].status, BlockType::HardBlock);
    }

    #[test]
    fn test_failed_mutation_keeps_cache_and_emits_nothing() {
        let mut engine = engine();
        let events = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&events);
        engine.subscribe(move |_| *counter.lock().unwrap() += 1);

        engine.get_rail_segments(&court("1"), day());
        let result = engine.remove_block(BlockId(42));

        assert!(result.is_not_found());
        assert_eq!(*events.lock().unwrap(), 0);
        assert!(engine.rails.is_cached(&court_day_key(&court("1"), day())));
    }

    #[test]
    fn test_subscribers_receive_changes() {
        let mut engine = engine();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let subscription = engine.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        let added = engine.apply_block(hard("1", "09:00", "10:00"));
        let id = added.block_ids[0];
        engine.move_block(MoveBlockOptions::new(id, r("11:00", "12:00")).to_court(court("2")));

        {
            let events = events.lock().unwrap();
            assert_eq!(events.len(), 2);
            assert!(matches!(events[0].kind, ChangeKind::BlockAdded { .. }));
            assert!(matches!(events[1].kind, ChangeKind::BlockMoved { .. }));
            assert_eq!(
                events[1].affected,
                vec![court_day_key(&court("1"), day()), court_day_key(&court("2"), day())]
            );
        }

        assert!(engine.unsubscribe(subscription));
        engine.remove_block(id);
        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_simulate_does_not_commit() {
        let mut engine = engine();
        engine.apply_block(hard("1", "09:00", "10:00"));
        let rail_before = engine.get_rail_segments(&court("1"), day());

        let preview = engine.simulate(&Mutation::ApplyBlock(hard("1", "12:00", "13:00")));

        assert!(preview.result.applied);
        assert_eq!(preview.result.block_ids, vec![BlockId(2)]);
        assert_eq!(engine.blocks().len(), 1);
        assert_eq!(engine.get_rail_segments(&court("1"), day()), rail_before);

        let key = court_day_key(&court("1"), day());
        assert_eq!(preview.rails[&key].len(), 5);
        let curve = &preview.capacity[&day()];
        assert_eq!(curve.point_at(t("12:30")).unwrap().hard_blocked, 1);
    }

    #[test]
    fn test_simulate_matches_commit() {
        let mut engine = engine();
        engine.apply_block(hard("1", "09:00", "10:00"));

        let mutation = Mutation::MoveBlock(MoveBlockOptions::new(BlockId(1), r("09:30", "11:00")));
        let preview = engine.simulate(&mutation);
        let result = engine.apply_mutation(&mutation);

        assert_eq!(preview.result, result);
        let key = court_day_key(&court("1"), day());
        assert_eq!(preview.rails[&key], engine.get_rail_segments(&court("1"), day()));
        assert_eq!(
            preview.capacity[&day()],
            engine.get_capacity_curve(day(), &CapacityOptions::default())
        );
    }

    #[test]
    fn test_simulate_rejected_mutation_reports_current_views() {
        let config = EngineConfig::default()
            .with_day_bounds(t("08:00"), t("20:00"))
            .with_allow_downgrade(false);
        let catalog = CourtCatalog::new(vec![court("1"), court("2")]).unwrap();
        let mut engine = Engine::new(config, catalog).unwrap();
        engine.apply_block(hard("1", "09:00", "10:00"));

        let soft = ApplyBlockOptions::new(court("1"), day(), r("09:30", "09:45"), BlockType::SoftBlock);
        let preview = engine.simulate(&Mutation::ApplyBlock(soft.clone()));
        let result = engine.apply_block(soft);

        assert!(!preview.result.applied);
        assert_eq!(preview.result.conflicts.len(), 1);
        assert_eq!(preview.result, result);

        let key = court_day_key(&court("1"), day());
        assert_eq!(preview.rails.len(), 1);
        assert_eq!(preview.rails[&key], engine.get_rail_segments(&court("1"), day()));
        assert_eq!(
            preview.capacity[&day()],
            engine.get_capacity_curve(day(), &CapacityOptions::default())
        );
    }

    #[test]
    fn test_simulate_reports_move_source_and_target() {
        let mut engine = engine();
        engine.apply_block(hard("1", "09:00", "10:00"));

        let preview = engine.simulate(&Mutation::MoveBlock(
            MoveBlockOptions::new(BlockId(1), r("07:00", "08:30")).to_court(court("2")),
        ));
        assert!(!preview.result.applied);
        let keys: Vec<CourtDayKey> = preview.rails.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![court_day_key(&court("1"), day()), court_day_key(&court("2"), day())]
        );
        assert_eq!(preview.rails[&keys[0]].len(), 3);

        let missing = engine.simulate(&Mutation::RemoveBlock {
            block_id: BlockId(9),
        });
        assert!(missing.result.is_not_found());
        assert!(missing.rails.is_empty());
        assert!(missing.capacity.is_empty());
    }

    #[test]
    fn test_capacity_court_subset() {
        let mut engine = engine();
        engine.apply_block(hard("1", "09:00", "10:00"));
        engine.apply_block(hard("3", "09:00", "10:00"));

        let options = CapacityOptions::default().for_courts(vec![court("1"), court("2"), court("9")]);
        let curve = engine.get_capacity_curve(day(), &options);

        assert_eq!(curve.total_courts, 2);
        let point = curve.point_at(t("09:15")).unwrap();
        assert_eq!(point.hard_blocked, 1);
        assert_eq!(point.available, 1);
    }

    #[test]
    fn test_sampled_capacity_uses_slot_minutes() {
        let engine = engine();
        let curve = engine.get_capacity_curve(day(), &CapacityOptions::sampled());
        assert_eq!(curve.points.len(), 12 * 4);

        let options = CapacityOptions {
            slot_minutes: Some(60),
            ..CapacityOptions::sampled()
        };
        assert_eq!(engine.get_capacity_curve(day(), &options).points.len(), 12);
    }

    #[test]
    fn test_capacity_stats() {
        let mut engine = engine();
        engine.apply_block(hard("1", "09:00", "11:00"));

        let stats = engine.get_capacity_stats(day());
        assert_eq!(stats.total_courts, 3);
        assert_eq!(stats.hard_blocked_court_minutes, 120);
        assert_eq!(stats.total_court_minutes(), 3 * 12 * 60);
        assert_eq!(stats.peak_hard_blocked, 1);
    }

    #[test]
    fn test_empty_resize_emits_nothing() {
        let mut engine = engine();
        engine.apply_block(hard("1", "09:00", "10:00"));
        let events = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&events);
        engine.subscribe(move |_| *counter.lock().unwrap() += 1);

        engine.get_rail_segments(&court("1"), day());
        let result = engine.resize_block(ResizeBlockOptions::new(BlockId(1), None, None));

        assert!(!result.applied);
        assert_eq!(*events.lock().unwrap(), 0);
        assert!(engine.rails.is_cached(&court_day_key(&court("1"), day())));
    }

    #[test]
    fn test_engine_moves_across_threads() {
        let mut engine = engine();
        let events = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&events);
        engine.subscribe(move |_| *counter.lock().unwrap() += 1);

        let worker = std::thread::spawn(move || {
            engine.apply_block(hard("1", "09:00", "10:00"));
            engine
        });
        let engine = worker.join().unwrap();

        assert_eq!(engine.blocks().len(), 1);
        assert_eq!(*events.lock().unwrap(), 1);
    }

    #[test]
    fn test_unknown_court_read_is_baseline() {
        let engine = engine();
        let rail = engine.get_rail_segments(&court("9"), day());
        assert_eq!(rail.len(), 1);
        assert_eq!(rail[0].status, BlockType::Available);
        assert!(engine.rails.is_empty());
    }
}
