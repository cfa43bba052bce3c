//! Per-run state.
//!
//! Everything that must not leak from one run into the next lives in a
//! [`RunContext`]: the congested lane set, the consumed spawn keys, the
//! entity registry and the statistics tracking map.  The campaign calls
//! [`RunContext::reset`] before every run.

use std::collections::{BTreeMap, BTreeSet};

use cf_core::{BuildingId, EdgeId, EntityId, Tick, TimeOfDay};
use cf_mobility::InjectCommand;
use cf_schedule::SpawnKey;

use crate::{
    CongestedLaneSet, CongestionReport, EntityTelemetry, FinishedEntity, RunStatsSnapshot, ShortBatch,
    StatsAggregator,
};

// ── LifecycleState ────────────────────────────────────────────────────────────

/// Ordered so that "forward" is `>`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    /// Injected, departure tick not reached yet.
    Pending,
    Live,
    Finished,
}

// ── PedestrianEntity ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct PedestrianEntity {
    pub id:                   EntityId,
    pub origin_building:      BuildingId,
    pub destination_building: BuildingId,
    pub origin_edge:          EdgeId,
    pub origin_offset:        f64,
    pub destination_edge:     EdgeId,
    pub destination_offset:   f64,
    /// Last route handed to the stepper.  Never empty.
    pub route:                Vec<EdgeId>,
    /// Desired speed in m/s.
    pub speed:                f64,
    pub departure_tick:       Tick,
    pub lifecycle_state:      LifecycleState,
    pub reroute_count:        u32,
    /// Sum of lane lengths along the initial route, in metres.
    pub planned_length:       f64,
}

impl PedestrianEntity {
    /// Move to `next` if that is forward; returns `true` on a change.
    pub fn advance_to(&mut self, next: LifecycleState) -> bool {
        if next > self.lifecycle_state {
            self.lifecycle_state = next;
            true
        } else {
            false
        }
    }

    pub fn inject_command(&self) -> InjectCommand {
        InjectCommand {
            entity:         self.id,
            edge:           self.origin_edge,
            offset:         self.origin_offset,
            depart:         self.departure_tick,
            route:          self.route.clone(),
            arrival_offset: self.destination_offset,
            speed:          self.speed,
        }
    }

    /// The part of `route` from `edge` onwards, or `None` when `edge` is not
    /// on it.
    pub fn remaining_from(&self, edge: EdgeId) -> Option<&[EdgeId]> {
        let pos = self.route.iter().position(|e| *e == edge)?;
        Some(&self.route[pos..])
    }
}

// ── RunContext ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunContext {
    pub congested:     CongestedLaneSet,
    pub stats:         StatsAggregator,
    consumed:          BTreeSet<SpawnKey>,
    entities:          BTreeMap<EntityId, PedestrianEntity>,
    next_entity:       u32,
    short_batches:     Vec<ShortBatch>,
    injected:          u64,
    skipped:           u64,
    finished:          u64,
    reroutes:          u64,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything.  Idempotent.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// `true` when nothing from a previous run remains.
    pub fn is_pristine(&self) -> bool {
        *self == Self::default()
    }

    // ── Spawn keys ────────────────────────────────────────────────────────

    pub fn is_consumed(&self, key: &SpawnKey) -> bool {
        self.consumed.contains(key)
    }

    /// Mark `key` consumed.  Returns `false` if it already was.
    pub fn consume(&mut self, key: SpawnKey) -> bool {
        self.consumed.insert(key)
    }

    pub fn consumed_keys(&self) -> impl Iterator<Item = &SpawnKey> {
        self.consumed.iter()
    }

    // ── Entity registry ───────────────────────────────────────────────────

    /// Next unused entity id of this run.
    pub fn allocate_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        id
    }

    pub fn register(&mut self, entity: PedestrianEntity) {
        self.injected += 1;
        self.entities.insert(entity.id, entity);
    }

    pub fn entity(&self, id: EntityId) -> Option<&PedestrianEntity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut PedestrianEntity> {
        self.entities.get_mut(&id)
    }

    pub fn entities(&self) -> &BTreeMap<EntityId, PedestrianEntity> {
        &self.entities
    }

    /// Apply the stepper's view of who is live and who is still pending.
    ///
    /// Registered entities reported live become `Live`; those reported
    /// neither live nor pending become `Finished` and are evicted.  Returns
    /// the evicted ids in ascending order.
    pub fn sync_lifecycle(&mut self, live: &BTreeSet<EntityId>, pending: &BTreeSet<EntityId>) -> Vec<EntityId> {
        let mut gone = Vec::new();
        for (id, entity) in self.entities.iter_mut() {
            if live.contains(id) {
                entity.advance_to(LifecycleState::Live);
            } else if !pending.contains(id) {
                entity.advance_to(LifecycleState::Finished);
                gone.push(*id);
            }
        }
        for id in &gone {
            self.entities.remove(id);
        }
        self.finished += gone.len() as u64;
        gone
    }

    /// Record a statistics sample against this run's registry.
    pub fn record_snapshot(
        &mut self,
        tick:       Tick,
        time:       TimeOfDay,
        live:       &BTreeSet<EntityId>,
        telemetry:  &[EntityTelemetry],
        congestion: &CongestionReport,
    ) -> (RunStatsSnapshot, Vec<FinishedEntity>) {
        self.stats.record(tick, time, live, telemetry, &self.entities, congestion)
    }

    // ── Counters ──────────────────────────────────────────────────────────

    pub fn record_skipped(&mut self, n: usize) {
        self.skipped += n as u64;
    }

    pub fn record_short_batch(&mut self, batch: ShortBatch) {
        self.short_batches.push(batch);
    }

    pub fn record_reroute(&mut self) {
        self.reroutes += 1;
    }

    pub fn short_batches(&self) -> &[ShortBatch] {
        &self.short_batches
    }

    pub fn injected(&self) -> u64 {
        self.injected
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Entities evicted from the registry this run.
    pub fn finished(&self) -> u64 {
        self.finished
    }

    pub fn reroutes(&self) -> u64 {
        self.reroutes
    }
}
