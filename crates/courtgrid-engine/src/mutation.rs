use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use courtgrid_core::{
    BlockId, BlockType, CapacityCurve, CourtDayKey, CourtRef, DayId, MutationError, Placement,
    RailSegment, TimeOfDay, TimeRange,
};

/// Create a single block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyBlockOptions {
    pub court: CourtRef,
    pub day: DayId,
    pub range: TimeRange,
    pub block_type: BlockType,
    /// Overrides the precedence rank of `block_type`.
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Commit even if the block conflicts with a higher-priority block.
    #[serde(default)]
    pub override_conflicts: bool,
}

impl ApplyBlockOptions {
    pub fn new(court: CourtRef, day: DayId, range: TimeRange, block_type: BlockType) -> Self {
        Self {
            court,
            day,
            range,
            block_type,
            priority: None,
            metadata: serde_json::Value::Null,
            override_conflicts: false,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_override(mut self) -> Self {
        self.override_conflicts = true;
        self
    }
}

/// Move an existing block to a new interval, and optionally court or day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveBlockOptions {
    pub block_id: BlockId,
    #[serde(default)]
    pub court: Option<CourtRef>,
    #[serde(default)]
    pub day: Option<DayId>,
    pub range: TimeRange,
    #[serde(default)]
    pub override_conflicts: bool,
}

impl MoveBlockOptions {
    pub fn new(block_id: BlockId, range: TimeRange) -> Self {
        Self {
            block_id,
            court: None,
            day: None,
            range,
            override_conflicts: false,
        }
    }

    pub fn to_court(mut self, court: CourtRef) -> Self {
        self.court = Some(court);
        self
    }

    pub fn to_day(mut self, day: DayId) -> Self {
        self.day = Some(day);
        self
    }

    pub fn with_override(mut self) -> Self {
        self.override_conflicts = true;
        self
    }
}

/// Change one or both ends of a block, keeping its court and day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeBlockOptions {
    pub block_id: BlockId,
    #[serde(default)]
    pub start: Option<TimeOfDay>,
    #[serde(default)]
    pub end: Option<TimeOfDay>,
    #[serde(default)]
    pub override_conflicts: bool,
}

impl ResizeBlockOptions {
    pub fn new(block_id: BlockId, start: Option<TimeOfDay>, end: Option<TimeOfDay>) -> Self {
        Self {
            block_id,
            start,
            end,
            override_conflicts: false,
        }
    }

    pub fn with_override(mut self) -> Self {
        self.override_conflicts = true;
        self
    }
}

/// Which days a template repeats on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DayPattern {
    Dates { days: Vec<DayId> },
    /// Every listed weekday between `from` and `to`, inclusive.
    Weekly {
        from: DayId,
        to: DayId,
        weekdays: Vec<Weekday>,
    },
}

impl DayPattern {
    /// Concrete days, ascending and without duplicates.
    pub fn expand(&self) -> Vec<DayId> {
        let days: BTreeSet<DayId> = match self {
            DayPattern::Dates { days } => days.iter().copied().collect(),
            DayPattern::Weekly { from, to, weekdays } => from
                .iter_days()
                .take_while(|d| d <= to)
                .filter(|d| weekdays.contains(&d.weekday()))
                .collect(),
        };
        days.into_iter().collect()
    }
}

fn default_atomic() -> bool {
    true
}

/// The same block stamped across a set of courts and days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateOptions {
    pub courts: Vec<CourtRef>,
    pub days: DayPattern,
    pub range: TimeRange,
    pub block_type: BlockType,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub override_conflicts: bool,
    /// Reject the whole template on any conflict. When false, the
    /// conflict-free placements are committed and the rest reported.
    #[serde(default = "default_atomic")]
    pub atomic: bool,
}

impl TemplateOptions {
    pub fn new(
        courts: Vec<CourtRef>,
        days: DayPattern,
        range: TimeRange,
        block_type: BlockType,
    ) -> Self {
        Self {
            courts,
            days,
            range,
            block_type,
            priority: None,
            metadata: serde_json::Value::Null,
            override_conflicts: false,
            atomic: true,
        }
    }

    pub fn partial(mut self) -> Self {
        self.atomic = false;
        self
    }

    pub fn with_override(mut self) -> Self {
        self.override_conflicts = true;
        self
    }

    /// Every (court, day) pair the template covers, deduplicated, ordered
    /// by day then court.
    pub fn placements(&self) -> Vec<(CourtRef, DayId)> {
        let courts: BTreeSet<&CourtRef> = self.courts.iter().collect();
        self.days
            .expand()
            .into_iter()
            .flat_map(|day| courts.iter().map(move |c| ((*c).clone(), day)))
            .collect()
    }
}

/// Any change the engine can commit or simulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    ApplyBlock(ApplyBlockOptions),
    MoveBlock(MoveBlockOptions),
    ResizeBlock(ResizeBlockOptions),
    RemoveBlock { block_id: BlockId },
    ApplyTemplate(TemplateOptions),
}

/// An overlap between an incoming block and an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub key: CourtDayKey,
    pub existing: BlockId,
    pub existing_type: BlockType,
    pub existing_priority: u32,
    pub incoming_type: BlockType,
    pub incoming_priority: u32,
    pub overlap: TimeRange,
}

/// Outcome of a mutation. Never stored by the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MutationResult {
    pub applied: bool,
    /// Blocks created or changed by the mutation.
    pub block_ids: Vec<BlockId>,
    pub warnings: Vec<ConflictReport>,
    pub conflicts: Vec<ConflictReport>,
    pub errors: Vec<MutationError>,
    /// Template placements left out of a partial commit.
    pub rejected: Vec<Placement>,
    /// Court-days whose derived views changed.
    pub affected: Vec<CourtDayKey>,
}

impl MutationResult {
    pub(crate) fn failed(error: impl Into<MutationError>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Self::default()
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.errors.iter().any(|e| e.is_not_found())
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// What a mutation would do, computed without committing it.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub result: MutationResult,
    /// Rails of every affected court-day after the mutation.
    pub rails: BTreeMap<CourtDayKey, Vec<RailSegment>>,
    /// Exact capacity curves of every affected day after the mutation.
    pub capacity: BTreeMap<DayId, CapacityCurve>,
}
