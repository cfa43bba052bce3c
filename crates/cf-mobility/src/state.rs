//! Per-entity walking state.

use cf_core::{EdgeId, EntityId, LaneId, Tick};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WalkPhase {
    /// Injected, departure tick not reached.
    Pending,
    Walking,
}

/// The walking state of one pedestrian.
///
/// `route[route_idx]` is the edge the pedestrian is on; `offset` is metres
/// from its start.  The walk ends when the last edge is reached and
/// `offset >= arrival_offset`.
#[derive(Clone, Debug, PartialEq)]
pub struct WalkState {
    pub phase:          WalkPhase,
    pub route:          Vec<EdgeId>,
    pub route_idx:      usize,
    pub offset:         f64,
    pub arrival_offset: f64,
    /// Desired speed (m/s).
    pub desired_speed:  f64,
    /// Speed achieved in the last tick (m/s).
    pub current_speed:  f64,
    pub depart:         Tick,
    pub lane_index:     u16,
    /// Consecutive seconds below the stall speed.
    pub waiting_secs:   f64,
}

impl WalkState {
    #[inline]
    pub fn current_edge(&self) -> EdgeId {
        self.route[self.route_idx]
    }

    #[inline]
    pub fn lane(&self) -> LaneId {
        LaneId::new(self.current_edge(), self.lane_index)
    }

    #[inline]
    pub fn on_last_edge(&self) -> bool {
        self.route_idx + 1 >= self.route.len()
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.phase == WalkPhase::Walking
    }
}

/// Lane an entity uses on an edge with `lanes` lanes.  Spreads pedestrians
/// across wide walkways deterministically.
#[inline]
pub fn lane_for(entity: EntityId, lanes: u16) -> u16 {
    (entity.0 % lanes.max(1) as u32) as u16
}
