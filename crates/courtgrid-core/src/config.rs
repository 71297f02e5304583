use serde::{Deserialize, Serialize};

use crate::block::BlockType;
use crate::error::ConfigError;
use crate::time::{TimeOfDay, TimeRange, MINUTES_PER_DAY};

/// Total order over block types, highest precedence first.
///
/// The rank of a type is its distance from the end of the list, so the
/// lowest-precedence type has rank 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BlockType>", into = "Vec<BlockType>")]
pub struct StatusPrecedence {
    order: Vec<BlockType>,
}

impl StatusPrecedence {
    /// Build from a highest-first list that names every block type once.
    pub fn new(order: Vec<BlockType>) -> Result<Self, ConfigError> {
        for (i, t) in order.iter().enumerate() {
            if order[..i].contains(t) {
                return Err(ConfigError::DuplicatePrecedence(*t));
            }
        }
        if let Some(missing) = BlockType::ALL.iter().find(|t| !order.contains(t)) {
            return Err(ConfigError::MissingPrecedence(*missing));
        }
        Ok(Self { order })
    }

    pub fn rank(&self, block_type: BlockType) -> u32 {
        self.order
            .iter()
            .position(|t| *t == block_type)
            .map(|i| (self.order.len() - i) as u32)
            .unwrap_or(0)
    }

    /// Types from highest to lowest precedence.
    pub fn order(&self) -> &[BlockType] {
        &self.order
    }
}

impl Default for StatusPrecedence {
    fn default() -> Self {
        Self {
            order: vec![
                BlockType::Closed,
                BlockType::HardBlock,
                BlockType::Maintenance,
                BlockType::Reserved,
                BlockType::Practice,
                BlockType::SoftBlock,
                BlockType::Available,
            ],
        }
    }
}

impl TryFrom<Vec<BlockType>> for StatusPrecedence {
    type Error = ConfigError;

    fn try_from(value: Vec<BlockType>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StatusPrecedence> for Vec<BlockType> {
    fn from(value: StatusPrecedence) -> Self {
        value.order
    }
}

/// Engine configuration. Fixed for the lifetime of an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sampling granularity for fixed-resolution capacity curves.
    pub slot_minutes: u16,
    pub day_start: TimeOfDay,
    pub day_end: TimeOfDay,
    pub status_precedence: StatusPrecedence,
    /// When false, overlapping a higher-priority block is a conflict
    /// instead of a warning.
    pub allow_downgrade: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 15,
            day_start: TimeOfDay::hm(6, 0).unwrap_or(TimeOfDay::MIDNIGHT),
            day_end: TimeOfDay::hm(23, 0).unwrap_or(TimeOfDay::END_OF_DAY),
            status_precedence: StatusPrecedence::default(),
            allow_downgrade: true,
        }
    }
}

impl EngineConfig {
    pub fn with_day_bounds(mut self, start: TimeOfDay, end: TimeOfDay) -> Self {
        self.day_start = start;
        self.day_end = end;
        self
    }

    pub fn with_slot_minutes(mut self, slot_minutes: u16) -> Self {
        self.slot_minutes = slot_minutes;
        self
    }

    pub fn with_precedence(mut self, precedence: StatusPrecedence) -> Self {
        self.status_precedence = precedence;
        self
    }

    pub fn with_allow_downgrade(mut self, allow: bool) -> Self {
        self.allow_downgrade = allow;
        self
    }

    /// The configured day range.
    pub fn day_range(&self) -> TimeRange {
        TimeRange::new(self.day_start, self.day_end)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_minutes == 0 || self.slot_minutes > MINUTES_PER_DAY {
            return Err(ConfigError::InvalidSlotMinutes(self.slot_minutes));
        }
        if self.day_start >= self.day_end {
            return Err(ConfigError::InvalidDayBounds {
                start: self.day_start,
                end: self.day_end,
            });
        }
        Ok(())
    }
}
