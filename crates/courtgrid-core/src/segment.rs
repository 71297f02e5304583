use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::block::{BlockId, BlockType, CapacityClass};
use crate::time::{DayId, TimeOfDay, TimeRange};

/// One resolved stretch of a court-day rail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailSegment {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub status: BlockType,
    /// Every block overlapping the segment, ascending by id.
    pub contributing_block_ids: Vec<BlockId>,
}

impl RailSegment {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }
}

/// How a capacity curve chooses its instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityMode {
    /// Fixed grid spaced by `slot_minutes`.
    Sampled,
    /// Every distinct segment boundary; never misses a short block.
    #[default]
    Exact,
}

/// Court counts at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityPoint {
    pub time: TimeOfDay,
    pub available: u32,
    pub soft_blocked: u32,
    pub hard_blocked: u32,
    pub by_status: BTreeMap<BlockType, u32>,
}

impl CapacityPoint {
    /// Build from per-status counts; class totals are derived.
    pub fn from_status_counts(time: TimeOfDay, by_status: BTreeMap<BlockType, u32>) -> Self {
        let mut point = Self {
            time,
            available: 0,
            soft_blocked: 0,
            hard_blocked: 0,
            by_status,
        };
        for (status, count) in &point.by_status {
            match status.capacity_class() {
                CapacityClass::Available => point.available += count,
                CapacityClass::SoftBlocked => point.soft_blocked += count,
                CapacityClass::HardBlocked => point.hard_blocked += count,
            }
        }
        point
    }

    pub fn total(&self) -> u32 {
        self.by_status.values().sum()
    }

    pub fn count(&self, status: BlockType) -> u32 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Same counts at a different instant.
    pub fn at(&self, time: TimeOfDay) -> Self {
        Self {
            time,
            ..self.clone()
        }
    }
}

/// Venue-wide court counts over one day.
///
/// Points are ascending by time. Each point's counts hold until the next
/// point, or until the end of `range` for the last one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityCurve {
    pub day: DayId,
    pub range: TimeRange,
    pub mode: CapacityMode,
    pub total_courts: u32,
    pub points: Vec<CapacityPoint>,
}

impl CapacityCurve {
    /// The point in effect at `t`, if `t` lies inside the curve.
    pub fn point_at(&self, t: TimeOfDay) -> Option<&CapacityPoint> {
        if !self.range.contains(t) {
            return None;
        }
        let idx = self.points.partition_point(|p| p.time <= t);
        idx.checked_sub(1).map(|i| &self.points[i])
    }

    /// End of the interval over which the point at `index` holds.
    pub fn point_end(&self, index: usize) -> TimeOfDay {
        self.points
            .get(index + 1)
            .map(|p| p.time)
            .unwrap_or(self.range.end)
    }
}
