use std::collections::{BTreeMap, BTreeSet, HashMap};

use courtgrid_core::{court_day_key, Block, BlockId, CourtDayKey, CourtRef, DayId, TimeRange};

/// Canonical block collection: an arena indexed by id plus a court-day index.
///
/// Cloning yields an independent hypothetical copy, which is how previews
/// are computed without touching the real collection.
#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    blocks: BTreeMap<BlockId, Block>,
    by_court_day: HashMap<CourtDayKey, BTreeSet<BlockId>>,
    last_id: u64,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All blocks, ascending by id.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Blocks of one court-day, ascending by id.
    pub fn for_court_day<'a>(&'a self, key: &CourtDayKey) -> impl Iterator<Item = &'a Block> + 'a {
        self.by_court_day
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.blocks.get(id))
    }

    pub fn for_day(&self, day: DayId) -> impl Iterator<Item = &Block> {
        self.blocks.values().filter(move |b| b.day == day)
    }

    /// The id the next insert will receive.
    pub fn next_id(&self) -> BlockId {
        BlockId(self.last_id + 1)
    }

    /// Insert a block, assigning it the next id. The id on `block` is ignored.
    pub fn insert(&mut self, mut block: Block) -> BlockId {
        self.last_id += 1;
        let id = BlockId(self.last_id);
        block.id = id;
        self.by_court_day.entry(block.key()).or_default().insert(id);
        self.blocks.insert(id, block);
        id
    }

    /// Move a block in place, keeping its id.
    ///
    /// Returns the previous block, or `None` if the id is unknown.
    pub fn relocate(
        &mut self,
        id: BlockId,
        court: CourtRef,
        day: DayId,
        range: TimeRange,
    ) -> Option<Block> {
        let block = self.blocks.get_mut(&id)?;
        let previous = block.clone();
        let old_key = previous.key();
        let new_key = court_day_key(&court, day);

        block.court = court;
        block.day = day;
        block.range = range;

        if old_key != new_key {
            self.unindex(&old_key, id);
            self.by_court_day.entry(new_key).or_default().insert(id);
        }
        Some(previous)
    }

    pub fn remove(&mut self, id: BlockId) -> Option<Block> {
        let block = self.blocks.remove(&id)?;
        self.unindex(&block.key(), id);
        Some(block)
    }

    fn unindex(&mut self, key: &CourtDayKey, id: BlockId) {
        if let Some(ids) = self.by_court_day.get_mut(key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_court_day.remove(key);
            }
        }
    }
}
