//! The `ScheduleSource` trait and an in-memory implementation.

use crate::{Building, DayType, OccupancyRow, ScheduleResult, SpawnEvent};

/// Read-only access to occupancy schedules and building coordinates.
///
/// Implementations must fail with [`ScheduleError::DataUnavailable`] when the
/// backing store cannot be reached.  An empty result means "nobody walks
/// today", never "the store was down".
///
/// [`ScheduleError::DataUnavailable`]: crate::ScheduleError::DataUnavailable
pub trait ScheduleSource {
    /// Spawn events for `day_type`, ordered by time of day.  Rows with a
    /// non-positive occupancy are dropped.
    fn events_for(&self, day_type: DayType) -> ScheduleResult<Vec<SpawnEvent>>;

    /// Every building a pedestrian may walk to.
    fn buildings(&self) -> ScheduleResult<Vec<Building>>;
}

impl<S: ScheduleSource + ?Sized> ScheduleSource for &S {
    fn events_for(&self, day_type: DayType) -> ScheduleResult<Vec<SpawnEvent>> {
        (**self).events_for(day_type)
    }

    fn buildings(&self) -> ScheduleResult<Vec<Building>> {
        (**self).buildings()
    }
}

/// Turn raw rows into the ordered event list for `day_type`.
///
/// Shared by every source so filtering and ordering cannot drift between
/// backends.
pub fn events_from_rows<'a, I>(rows: I, day_type: DayType) -> Vec<SpawnEvent>
where
    I: IntoIterator<Item = &'a OccupancyRow>,
{
    let mut events: Vec<SpawnEvent> = rows
        .into_iter()
        .filter(|r| r.day_type == day_type)
        .filter_map(OccupancyRow::to_event)
        .collect();
    events.sort_by_key(|e| (e.time_of_day, e.building_id));
    events
}

// ── MemoryScheduleSource ──────────────────────────────────────────────────────

/// A schedule held entirely in memory.  Used by tests and the demo.
#[derive(Clone, Debug, Default)]
pub struct MemoryScheduleSource {
    rows:      Vec<OccupancyRow>,
    buildings: Vec<Building>,
}

impl MemoryScheduleSource {
    pub fn new(rows: Vec<OccupancyRow>, buildings: Vec<Building>) -> Self {
        Self { rows, buildings }
    }

    pub fn rows(&self) -> &[OccupancyRow] {
        &self.rows
    }
}

impl ScheduleSource for MemoryScheduleSource {
    fn events_for(&self, day_type: DayType) -> ScheduleResult<Vec<SpawnEvent>> {
        Ok(events_from_rows(&self.rows, day_type))
    }

    fn buildings(&self) -> ScheduleResult<Vec<Building>> {
        Ok(self.buildings.clone())
    }
}
