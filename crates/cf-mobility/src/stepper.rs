//! The stepper boundary.
//!
//! A stepper owns the microscopic simulation: it places pedestrians on the
//! network, moves them one tick at a time and answers telemetry queries.
//! The engine drives it exclusively through [`Stepper`], so a TraCI bridge
//! and the in-process [`WalkStepper`](crate::WalkStepper) are interchangeable.
//!
//! # Session model
//!
//! One session per run: `open` → inject / advance / query … → `close`.
//! Every call outside an open session fails with
//! [`StepperError::Session`](crate::StepperError::Session).

use cf_core::{EdgeId, EntityId, GeoPoint, LaneId, Position, Tick};

use crate::StepperResult;

/// Everything needed to put one pedestrian on the network.
#[derive(Clone, Debug, PartialEq)]
pub struct InjectCommand {
    pub entity:         EntityId,
    /// Edge the pedestrian starts on.  Must equal `route[0]`.
    pub edge:           EdgeId,
    /// Metres from the start of `edge`.
    pub offset:         f64,
    /// Tick at which the pedestrian appears.  Until then it is pending.
    pub depart:         Tick,
    pub route:          Vec<EdgeId>,
    /// Metres along the last route edge where the walk ends.
    pub arrival_offset: f64,
    /// Desired walking speed in m/s.
    pub speed:          f64,
}

pub trait Stepper {
    // ── Session ───────────────────────────────────────────────────────────

    fn open(&mut self) -> StepperResult<()>;
    fn close(&mut self) -> StepperResult<()>;
    fn is_open(&self) -> bool;

    // ── Commands ──────────────────────────────────────────────────────────

    fn inject(&mut self, cmd: &InjectCommand) -> StepperResult<()>;

    /// Submit a whole tick's injections at once.  One result per command, in
    /// order.  Steppers with a batch API override this.
    fn inject_batch(&mut self, cmds: &[InjectCommand]) -> Vec<StepperResult<()>> {
        cmds.iter().map(|c| self.inject(c)).collect()
    }

    /// Replace the remaining route.  `edges[0]` must be the entity's current
    /// edge.
    fn set_route(&mut self, entity: EntityId, edges: &[EdgeId], arrival_offset: f64) -> StepperResult<()>;

    fn set_speed(&mut self, entity: EntityId, speed: f64) -> StepperResult<()>;

    /// Advance one tick.  Returns the new current tick.
    fn advance(&mut self) -> StepperResult<Tick>;

    // ── Queries ───────────────────────────────────────────────────────────

    fn current_tick(&self) -> Tick;

    /// Entities currently walking, in ascending id order.
    fn live_entity_ids(&self) -> Vec<EntityId>;

    /// Injected entities whose departure tick has not come yet.
    fn pending_entity_ids(&self) -> Vec<EntityId>;

    /// Live plus pending.  Zero means the stepper has nothing left to do.
    fn expected_count(&self) -> usize {
        self.live_entity_ids().len() + self.pending_entity_ids().len()
    }

    fn position(&self, entity: EntityId) -> StepperResult<Position>;
    /// Current (not desired) speed in m/s.
    fn speed(&self, entity: EntityId) -> StepperResult<f64>;
    /// Seconds the entity has been standing still.
    fn waiting_time(&self, entity: EntityId) -> StepperResult<f64>;
    fn lane_of(&self, entity: EntityId) -> StepperResult<LaneId>;

    /// Every lane in the network.
    fn lane_ids(&self) -> Vec<LaneId>;
    /// `None` when the stepper does not know the lane.
    fn lane_length(&self, lane: LaneId) -> Option<f64>;

    /// First shape point of `lane`, when the stepper has geometry.
    fn lane_geo(&self, _lane: LaneId) -> Option<GeoPoint> {
        None
    }
}
