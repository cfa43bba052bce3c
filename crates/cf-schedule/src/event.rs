//! Schedule rows, buildings and spawn events.

use cf_core::{BuildingId, GeoPoint, TimeOfDay};

use crate::DayType;

/// A campus building: the origin or destination of a walk.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Building {
    pub id:       BuildingId,
    pub name:     String,
    pub location: GeoPoint,
}

/// One row of the occupancy schedule, as the store holds it.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyRow {
    pub building_id: BuildingId,
    pub name:        String,
    pub location:    GeoPoint,
    pub start_time:  TimeOfDay,
    pub end_time:    TimeOfDay,
    /// Signed: the store does not constrain it, and non-positive rows are
    /// dropped rather than rejected.
    pub occupancy:   i64,
    pub day_type:    DayType,
}

impl OccupancyRow {
    /// The spawn event this row produces, or `None` for an empty slot.
    ///
    /// Occupants leave when the slot ends, so the event fires at `end_time`.
    pub fn to_event(&self) -> Option<SpawnEvent> {
        let count = u32::try_from(self.occupancy).ok().filter(|&n| n > 0)?;
        Some(SpawnEvent {
            building_id:     self.building_id,
            time_of_day:     self.end_time,
            occupancy_count: count,
            origin:          self.location,
        })
    }
}

// ── SpawnEvent ────────────────────────────────────────────────────────────────

/// Identity of a spawn event within one run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpawnKey {
    pub building_id: BuildingId,
    pub time_of_day: TimeOfDay,
}

impl std::fmt::Display for SpawnKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.building_id, self.time_of_day)
    }
}

/// "`occupancy_count` pedestrians leave `building_id` at `time_of_day`."
///
/// Immutable once built.  Always has `occupancy_count > 0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpawnEvent {
    pub building_id:     BuildingId,
    pub time_of_day:     TimeOfDay,
    pub occupancy_count: u32,
    pub origin:          GeoPoint,
}

impl SpawnEvent {
    #[inline]
    pub fn key(&self) -> SpawnKey {
        SpawnKey { building_id: self.building_id, time_of_day: self.time_of_day }
    }
}
