//! `WalkStepper` — an in-process [`Stepper`] over a [`WalkNetwork`].
//!
//! # Movement model
//!
//! Each tick (one second):
//!
//! 1. Pending pedestrians whose departure tick has come start walking.
//! 2. Lane occupancy is counted once, before anyone moves.
//! 3. Every walker advances `desired_speed × multiplier` metres, where
//!    `multiplier = (1 − (density / jam_density)²).max(min_speed_factor)`.
//!    Leftover distance carries onto the next route edge.
//! 4. Walkers that pass `arrival_offset` on their last edge are removed.
//!
//! Consecutive edges need not share a node: a direct fallback route simply
//! jumps to the start of the next edge.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use cf_core::{EdgeId, EntityId, GeoPoint, LaneId, Position, Tick};
use cf_spatial::WalkNetwork;

use crate::state::lane_for;
use crate::{InjectCommand, Stepper, StepperError, StepperResult, WalkPhase, WalkState, WalkStore};

/// Tuning for the density slowdown.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WalkConfig {
    /// Pedestrians per metre of lane at which walking nearly stops.
    pub jam_density:      f64,
    /// Floor of the speed multiplier.
    pub min_speed_factor: f64,
    /// Below this speed (m/s) a pedestrian counts as waiting.
    pub stall_speed:      f64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self { jam_density: 4.0, min_speed_factor: 0.1, stall_speed: 0.1 }
    }
}

/// Speed multiplier for a lane at `density`.
pub fn walking_speed_multiplier(density: f64, config: &WalkConfig) -> f64 {
    let ratio = (density / config.jam_density).max(0.0);
    (1.0 - ratio * ratio).max(config.min_speed_factor)
}

pub struct WalkStepper {
    network: Arc<WalkNetwork>,
    config:  WalkConfig,
    store:   WalkStore,
    now:     Tick,
    open:    bool,
    arrived: u64,
}

impl WalkStepper {
    pub fn new(network: Arc<WalkNetwork>, config: WalkConfig) -> Self {
        Self {
            network,
            config,
            store: WalkStore::new(),
            now: Tick::ZERO,
            open: false,
            arrived: 0,
        }
    }

    pub fn network(&self) -> &WalkNetwork {
        &self.network
    }

    pub fn store(&self) -> &WalkStore {
        &self.store
    }

    /// Pedestrians that completed their walk in this session.
    pub fn arrived(&self) -> u64 {
        self.arrived
    }

    fn ensure_open(&self) -> StepperResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(StepperError::Session("no open session".into()))
        }
    }

    fn check_route(&self, entity: EntityId, edges: &[EdgeId]) -> StepperResult<()> {
        if edges.is_empty() {
            return Err(StepperError::fault(entity, "empty route"));
        }
        if let Some(bad) = edges.iter().find(|e| !self.network.contains_edge(**e)) {
            return Err(StepperError::fault(entity, format!("unknown edge {bad}")));
        }
        Ok(())
    }

    fn live(&self, entity: EntityId) -> StepperResult<&WalkState> {
        self.ensure_open()?;
        self.store.live(entity).ok_or(StepperError::UnknownEntity(entity))
    }

    fn edge_len(&self, edge: EdgeId) -> f64 {
        self.network.edge_length_m[edge.index()] as f64
    }

    fn lanes_on(&self, edge: EdgeId) -> u16 {
        self.network.edge_lanes[edge.index()]
    }

    /// Move one walker; returns `true` when it arrived.
    fn step_walker(&self, id: EntityId, s: &mut WalkState, occupancy: &FxHashMap<LaneId, u32>) -> bool {
        let lane = s.lane();
        let count = occupancy.get(&lane).copied().unwrap_or(0) as f64;
        let len = self.network.lane_length(lane).filter(|l| *l > 0.0).unwrap_or(1.0);
        let multiplier = walking_speed_multiplier(count / len, &self.config);

        let v = s.desired_speed * multiplier;
        s.current_speed = v;
        if v < self.config.stall_speed {
            s.waiting_secs += 1.0;
        } else {
            s.waiting_secs = 0.0;
        }

        let mut remaining = v;
        loop {
            let edge = s.current_edge();
            let end = if s.on_last_edge() {
                s.arrival_offset.clamp(0.0, self.edge_len(edge))
            } else {
                self.edge_len(edge)
            };
            let room = (end - s.offset).max(0.0);
            if remaining < room {
                s.offset += remaining;
                return false;
            }
            remaining -= room;
            if s.on_last_edge() {
                s.offset = end;
                return true;
            }
            s.route_idx += 1;
            s.offset = 0.0;
            s.lane_index = lane_for(id, self.lanes_on(s.current_edge()));
        }
    }
}

impl Stepper for WalkStepper {
    fn open(&mut self) -> StepperResult<()> {
        if self.open {
            return Err(StepperError::Session("session already open".into()));
        }
        self.store.clear();
        self.now = Tick::ZERO;
        self.arrived = 0;
        self.open = true;
        tracing::debug!(edges = self.network.edge_count(), "walk stepper session opened");
        Ok(())
    }

    fn close(&mut self) -> StepperResult<()> {
        self.ensure_open()?;
        tracing::debug!(
            tick = self.now.0,
            arrived = self.arrived,
            remaining = self.store.len(),
            "walk stepper session closed"
        );
        self.store.clear();
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn inject(&mut self, cmd: &InjectCommand) -> StepperResult<()> {
        self.ensure_open()?;
        let id = cmd.entity;
        if self.store.contains(id) {
            return Err(StepperError::fault(id, "duplicate id"));
        }
        self.check_route(id, &cmd.route)?;
        if cmd.route[0] != cmd.edge {
            return Err(StepperError::fault(id, format!("route does not start on {}", cmd.edge)));
        }
        if !(cmd.speed.is_finite() && cmd.speed > 0.0) {
            return Err(StepperError::fault(id, format!("invalid speed {}", cmd.speed)));
        }

        let offset = cmd.offset.clamp(0.0, self.edge_len(cmd.edge));
        self.store.insert(id, WalkState {
            phase:          WalkPhase::Pending,
            route:          cmd.route.clone(),
            route_idx:      0,
            offset,
            arrival_offset: cmd.arrival_offset,
            desired_speed:  cmd.speed,
            current_speed:  0.0,
            depart:         cmd.depart,
            lane_index:     lane_for(id, self.lanes_on(cmd.edge)),
            waiting_secs:   0.0,
        });
        Ok(())
    }

    fn set_route(&mut self, entity: EntityId, edges: &[EdgeId], arrival_offset: f64) -> StepperResult<()> {
        self.ensure_open()?;
        self.check_route(entity, edges)?;
        let lanes = self.lanes_on(edges[0]);
        let s = self.store.get_mut(entity).ok_or(StepperError::UnknownEntity(entity))?;
        if s.current_edge() != edges[0] {
            return Err(StepperError::fault(
                entity,
                format!("new route starts on {} but entity is on {}", edges[0], s.current_edge()),
            ));
        }
        s.route = edges.to_vec();
        s.route_idx = 0;
        s.arrival_offset = arrival_offset;
        s.lane_index = s.lane_index.min(lanes.saturating_sub(1));
        Ok(())
    }

    fn set_speed(&mut self, entity: EntityId, speed: f64) -> StepperResult<()> {
        self.ensure_open()?;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(StepperError::fault(entity, format!("invalid speed {speed}")));
        }
        let s = self.store.get_mut(entity).ok_or(StepperError::UnknownEntity(entity))?;
        s.desired_speed = speed;
        Ok(())
    }

    fn advance(&mut self) -> StepperResult<Tick> {
        self.ensure_open()?;
        self.now = self.now + 1;
        let now = self.now;

        let departing: Vec<EntityId> = self
            .store
            .states
            .iter()
            .filter(|(_, s)| s.phase == WalkPhase::Pending && s.depart <= now)
            .map(|(&id, _)| id)
            .collect();
        for id in departing {
            self.store.activate(id);
        }

        let mut occupancy: FxHashMap<LaneId, u32> = FxHashMap::default();
        for s in self.store.states.values().filter(|s| s.is_live()) {
            *occupancy.entry(s.lane()).or_insert(0) += 1;
        }

        // Move walkers with the store taken out so `step_walker` can borrow
        // the network through `self`.
        let mut store = std::mem::take(&mut self.store);
        let mut finished = Vec::new();
        for (&id, s) in store.states.iter_mut().filter(|(_, s)| s.is_live()) {
            if self.step_walker(id, s, &occupancy) {
                finished.push(id);
            }
        }
        for id in &finished {
            store.remove(*id);
        }
        self.store = store;
        self.arrived += finished.len() as u64;

        Ok(now)
    }

    fn current_tick(&self) -> Tick {
        self.now
    }

    fn live_entity_ids(&self) -> Vec<EntityId> {
        self.store.live_ids()
    }

    fn pending_entity_ids(&self) -> Vec<EntityId> {
        self.store.pending_ids()
    }

    fn expected_count(&self) -> usize {
        self.store.len()
    }

    fn position(&self, entity: EntityId) -> StepperResult<Position> {
        let s = self.live(entity)?;
        Ok(self.network.point_along(s.current_edge(), s.offset))
    }

    fn speed(&self, entity: EntityId) -> StepperResult<f64> {
        Ok(self.live(entity)?.current_speed)
    }

    fn waiting_time(&self, entity: EntityId) -> StepperResult<f64> {
        Ok(self.live(entity)?.waiting_secs)
    }

    fn lane_of(&self, entity: EntityId) -> StepperResult<LaneId> {
        Ok(self.live(entity)?.lane())
    }

    fn lane_ids(&self) -> Vec<LaneId> {
        self.network.lane_ids().collect()
    }

    fn lane_length(&self, lane: LaneId) -> Option<f64> {
        self.network.lane_length(lane)
    }

    fn lane_geo(&self, lane: LaneId) -> Option<GeoPoint> {
        self.network.lane_geo(lane)
    }
}
