use serde::{Deserialize, Serialize};

use courtgrid_core::{Block, CourtDayKey, RailSegment, StatusPrecedence, TimeRange};

use crate::rail::derive_rail_segments;

/// All blocks of one court on one day, ascending by id.
///
/// Rebuilt from the block collection on demand; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityDayTimeline {
    pub key: CourtDayKey,
    pub range: TimeRange,
    pub blocks: Vec<Block>,
}

impl FacilityDayTimeline {
    /// Collect the blocks belonging to `key` out of a larger set.
    pub fn collect<'a>(
        key: CourtDayKey,
        range: TimeRange,
        blocks: impl IntoIterator<Item = &'a Block>,
    ) -> Self {
        let mut blocks: Vec<Block> = blocks
            .into_iter()
            .filter(|b| b.court == key.court && b.day == key.day)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| b.id);
        Self { key, range, blocks }
    }

    pub fn rail_segments(&self, precedence: &StatusPrecedence) -> Vec<RailSegment> {
        derive_rail_segments(&self.blocks, &self.range, precedence)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
