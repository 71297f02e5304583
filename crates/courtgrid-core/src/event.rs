use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockId};
use crate::court::{CourtDayKey, CourtRef};
use crate::time::{DayId, TimeRange};

/// Where a block sat before or after a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub court: CourtRef,
    pub day: DayId,
    pub range: TimeRange,
}

impl Placement {
    pub fn of(block: &Block) -> Self {
        Self {
            court: block.court.clone(),
            day: block.day,
            range: block.range,
        }
    }
}

/// What a committed mutation changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeKind {
    BlockAdded {
        block: Block,
    },
    BlockMoved {
        block_id: BlockId,
        from: Placement,
        to: Placement,
    },
    BlockResized {
        block_id: BlockId,
        from: TimeRange,
        to: TimeRange,
    },
    BlockRemoved {
        block: Block,
    },
    TemplateApplied {
        block_ids: Vec<BlockId>,
    },
}

/// Notification delivered to subscribers after each commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Court-days whose derived views changed, ascending.
    pub affected: Vec<CourtDayKey>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, mut affected: Vec<CourtDayKey>) -> Self {
        affected.sort();
        affected.dedup();
        Self { kind, affected }
    }

    /// Block ids touched by this change.
    pub fn block_ids(&self) -> Vec<BlockId> {
        match &self.kind {
            ChangeKind::BlockAdded { block } | ChangeKind::BlockRemoved { block } => {
                vec![block.id]
            }
            ChangeKind::BlockMoved { block_id, .. } | ChangeKind::BlockResized { block_id, .. } => {
                vec![*block_id]
            }
            ChangeKind::TemplateApplied { block_ids } => block_ids.clone(),
        }
    }
}
