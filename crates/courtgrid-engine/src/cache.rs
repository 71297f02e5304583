use std::cell::RefCell;
use std::collections::HashMap;

use courtgrid_core::{CourtDayKey, RailSegment};

/// Derived rails per court-day. An absent entry is dirty.
///
/// Reads fill the cache through `&self`; mutations drop the entries of every
/// court-day they touch.
#[derive(Debug, Default)]
pub struct RailCache {
    entries: RefCell<HashMap<CourtDayKey, Vec<RailSegment>>>,
}

impl RailCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached rail for `key`, deriving and storing it on a miss.
    pub fn get_or_derive(
        &self,
        key: &CourtDayKey,
        derive: impl FnOnce() -> Vec<RailSegment>,
    ) -> Vec<RailSegment> {
        if let Some(rail) = self.entries.borrow().get(key) {
            tracing::trace!("Rail cache hit for {}", key);
            return rail.clone();
        }

        tracing::trace!("Rail cache miss for {}", key);
        let rail = derive();
        self.entries.borrow_mut().insert(key.clone(), rail.clone());
        rail
    }

    pub fn invalidate<'a>(&self, keys: impl IntoIterator<Item = &'a CourtDayKey>) {
        let mut entries = self.entries.borrow_mut();
        for key in keys {
            entries.remove(key);
        }
    }

    pub fn is_cached(&self, key: &CourtDayKey) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
