use serde::{Deserialize, Serialize};

use crate::court::{court_day_key, CourtDayKey, CourtRef};
use crate::time::{DayId, TimeRange};

/// Engine-assigned block identifier. Allocated in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u64);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block-{}", self.0)
    }
}

/// Kind of availability a block asserts over its interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Available,
    SoftBlock,
    Practice,
    Reserved,
    Maintenance,
    HardBlock,
    Closed,
}

impl BlockType {
    pub const ALL: [BlockType; 7] = [
        BlockType::Available,
        BlockType::SoftBlock,
        BlockType::Practice,
        BlockType::Reserved,
        BlockType::Maintenance,
        BlockType::HardBlock,
        BlockType::Closed,
    ];

    /// Bucket used when tallying capacity.
    pub fn capacity_class(self) -> CapacityClass {
        match self {
            BlockType::Available => CapacityClass::Available,
            BlockType::SoftBlock | BlockType::Practice | BlockType::Reserved => {
                CapacityClass::SoftBlocked
            }
            BlockType::Maintenance | BlockType::HardBlock | BlockType::Closed => {
                CapacityClass::HardBlocked
            }
        }
    }
}

/// Coarse capacity bucket a status falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityClass {
    Available,
    SoftBlocked,
    HardBlocked,
}

/// A canonical interval of one court-day carrying a status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub court: CourtRef,
    pub day: DayId,
    pub range: TimeRange,
    pub block_type: BlockType,
    /// Resolved priority. Defaults to the precedence rank of `block_type`.
    pub priority: u32,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Block {
    pub fn key(&self) -> CourtDayKey {
        court_day_key(&self.court, self.day)
    }
}
