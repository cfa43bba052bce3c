//! The `WalkStore` — sparse per-entity state.

use std::collections::BTreeMap;

use cf_core::EntityId;

use crate::{WalkPhase, WalkState};

/// Walking state for every injected, not yet arrived pedestrian.
///
/// A `BTreeMap` keeps id order stable, so iteration (and therefore every
/// telemetry answer) is deterministic.  Entries are removed on arrival.
#[derive(Default)]
pub struct WalkStore {
    pub states: BTreeMap<EntityId, WalkState>,
    pending:    usize,
}

impl WalkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: EntityId, state: WalkState) {
        if state.phase == WalkPhase::Pending {
            self.pending += 1;
        }
        self.states.insert(id, state);
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&WalkState> {
        self.states.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut WalkState> {
        self.states.get_mut(&id)
    }

    /// Live entity state, or `None` if absent or pending.
    pub fn live(&self, id: EntityId) -> Option<&WalkState> {
        self.states.get(&id).filter(|s| s.is_live())
    }

    /// Flip `id` from pending to walking.
    pub fn activate(&mut self, id: EntityId) {
        if let Some(s) = self.states.get_mut(&id) {
            if s.phase == WalkPhase::Pending {
                s.phase = WalkPhase::Walking;
                self.pending -= 1;
            }
        }
    }

    pub fn remove(&mut self, id: EntityId) -> Option<WalkState> {
        let s = self.states.remove(&id)?;
        if s.phase == WalkPhase::Pending {
            self.pending -= 1;
        }
        Some(s)
    }

    pub fn live_ids(&self) -> Vec<EntityId> {
        self.states.iter().filter(|(_, s)| s.is_live()).map(|(&id, _)| id).collect()
    }

    pub fn pending_ids(&self) -> Vec<EntityId> {
        self.states.iter().filter(|(_, s)| !s.is_live()).map(|(&id, _)| id).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.pending = 0;
    }
}
