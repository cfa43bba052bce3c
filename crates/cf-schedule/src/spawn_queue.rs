//! `SpawnQueue` — spawn events indexed by time of day.
//!
//! Built once per day type and shared by every run of that day type.  The
//! queue itself never changes during a run: which keys have fired is per-run
//! state held by the caller, so resetting a run never has to rebuild it.
//!
//! `BTreeMap` gives O(log W) lookup, W = distinct departure times (a few
//! hundred for a campus timetable), and ordered range scans for the
//! "anything left to spawn?" check that ends a run early.

use std::collections::BTreeMap;

use cf_core::{SECS_PER_DAY, TimeOfDay};

use crate::{SpawnEvent, SpawnKey};

#[derive(Clone, Debug, Default)]
pub struct SpawnQueue {
    inner: BTreeMap<TimeOfDay, Vec<SpawnEvent>>,
    /// Cached total event count for O(1) `len()`.
    total: usize,
}

impl SpawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `events` by time of day.
    ///
    /// Events sharing a key are merged by summing their occupancy, so each
    /// key appears once and is consumed at most once.
    pub fn from_events(events: impl IntoIterator<Item = SpawnEvent>) -> Self {
        let mut queue = Self::new();
        for event in events {
            queue.push(event);
        }
        queue
    }

    pub fn push(&mut self, event: SpawnEvent) {
        let slot = self.inner.entry(event.time_of_day).or_default();
        if let Some(existing) = slot.iter_mut().find(|e| e.building_id == event.building_id) {
            tracing::debug!(key = %event.key(), "merging duplicate spawn event");
            existing.occupancy_count = existing.occupancy_count.saturating_add(event.occupancy_count);
            return;
        }
        slot.push(event);
        self.total += 1;
    }

    /// Events departing at exactly `tod`, in insertion order.
    pub fn events_at(&self, tod: TimeOfDay) -> &[SpawnEvent] {
        self.inner.get(&tod).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `true` if any event whose key is not yet consumed departs within the
    /// `ticks` seconds starting at `from` (inclusive), wrapping at midnight.
    pub fn has_pending_within(
        &self,
        from:        TimeOfDay,
        ticks:       u64,
        is_consumed: impl Fn(&SpawnKey) -> bool,
    ) -> bool {
        if ticks == 0 {
            return false;
        }
        let pending = |(_, events): (&TimeOfDay, &Vec<SpawnEvent>)| {
            events.iter().any(|e| !is_consumed(&e.key()))
        };

        if ticks >= SECS_PER_DAY as u64 {
            return self.inner.iter().any(pending);
        }
        let end = from.secs() as u64 + ticks;
        if end <= SECS_PER_DAY as u64 {
            if end == SECS_PER_DAY as u64 {
                return self.inner.range(from..).any(pending);
            }
            return self.inner.range(from..TimeOfDay::from_secs(end as u32)).any(pending);
        }
        let wrapped = TimeOfDay::from_secs((end - SECS_PER_DAY as u64) as u32);
        self.inner.range(from..).any(pending) || self.inner.range(..wrapped).any(pending)
    }

    /// All events in departure order.
    pub fn iter(&self) -> impl Iterator<Item = &SpawnEvent> {
        self.inner.values().flatten()
    }

    /// Total pedestrians the queue would spawn if every event fired.
    pub fn total_occupancy(&self) -> u64 {
        self.iter().map(|e| e.occupancy_count as u64).sum()
    }

    /// Total number of distinct spawn keys.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct departure times.
    pub fn time_count(&self) -> usize {
        self.inner.len()
    }
}
