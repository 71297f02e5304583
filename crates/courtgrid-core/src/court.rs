use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::ConfigError;
use crate::time::DayId;

/// Identity of one court within one facility.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CourtRef {
    pub facility_id: String,
    pub court_id: String,
}

impl CourtRef {
    pub fn new(facility_id: impl Into<String>, court_id: impl Into<String>) -> Self {
        Self {
            facility_id: facility_id.into(),
            court_id: court_id.into(),
        }
    }
}

impl std::fmt::Display for CourtRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.facility_id, self.court_id)
    }
}

/// Composite key for one court on one day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CourtDayKey {
    pub court: CourtRef,
    pub day: DayId,
}

impl std::fmt::Display for CourtDayKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.court, self.day.format("%Y-%m-%d"))
    }
}

/// Build the composite key for a court-day.
pub fn court_day_key(court: &CourtRef, day: DayId) -> CourtDayKey {
    CourtDayKey {
        court: court.clone(),
        day,
    }
}

/// The set of courts an engine accepts blocks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CourtRef>", into = "Vec<CourtRef>")]
pub struct CourtCatalog {
    courts: BTreeSet<CourtRef>,
}

impl CourtCatalog {
    /// Build a catalog, rejecting duplicate courts.
    pub fn new(courts: impl IntoIterator<Item = CourtRef>) -> Result<Self, ConfigError> {
        let mut set = BTreeSet::new();
        for court in courts {
            if set.contains(&court) {
                return Err(ConfigError::DuplicateCourt(court));
            }
            set.insert(court);
        }
        Ok(Self { courts: set })
    }

    pub fn contains(&self, court: &CourtRef) -> bool {
        self.courts.contains(court)
    }

    pub fn len(&self) -> usize {
        self.courts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courts.is_empty()
    }

    /// Courts in catalog order (facility, then court).
    pub fn iter(&self) -> impl Iterator<Item = &CourtRef> {
        self.courts.iter()
    }

    /// Courts belonging to one facility.
    pub fn facility<'a>(&'a self, facility_id: &'a str) -> impl Iterator<Item = &'a CourtRef> {
        self.courts
            .iter()
            .filter(move |c| c.facility_id == facility_id)
    }
}

impl TryFrom<Vec<CourtRef>> for CourtCatalog {
    type Error = ConfigError;

    fn try_from(value: Vec<CourtRef>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CourtCatalog> for Vec<CourtRef> {
    fn from(value: CourtCatalog) -> Self {
        value.courts.into_iter().collect()
    }
}
