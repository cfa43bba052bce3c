//! Turning spawn events into injected pedestrians.
//!
//! # Per tick
//!
//! 1. Take the events departing at the tick's time of day whose key the run
//!    has not consumed yet.
//! 2. For each event, plan `occupancy_count` pedestrians: a uniformly random
//!    destination building (the origin itself included), a snapped origin
//!    and destination, a route, a walking speed and a jittered departure.
//!    The key is consumed as soon as the event's pedestrians are planned,
//!    whatever happens to them afterwards.
//! 3. Submit every planned pedestrian in one `inject_batch` call.
//!
//! Each pedestrian ends as [`SpawnOutcome::Injected`] or
//! [`SpawnOutcome::Skipped`]; none of these outcomes interrupts the batch.

use std::fmt;

use cf_core::{EntityId, GeoPoint, SimRng, Tick, TimeOfDay};
use cf_mobility::Stepper;
use cf_schedule::{Building, SpawnEvent, SpawnKey, SpawnQueue};
use cf_spatial::{EdgePosition, RouteOracle, RouteOracleClient};

use crate::{CampaignConfig, LaneLengthTable, LifecycleState, PedestrianEntity, RunContext, SimError, SimResult};

// ── Outcomes ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    /// The schedule has no buildings to walk to.
    NoDestination,
    /// The oracle could not snap this coordinate onto the network.
    Unlocatable(GeoPoint),
    /// The stepper refused the injection.
    Rejected(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoDestination  => f.write_str("no destination buildings"),
            SkipReason::Unlocatable(p) => write!(f, "cannot locate {p}"),
            SkipReason::Rejected(why)  => write!(f, "rejected by stepper: {why}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpawnOutcome {
    Injected(EntityId),
    Skipped { entity: EntityId, reason: SkipReason },
}

impl SpawnOutcome {
    pub fn entity(&self) -> EntityId {
        match self {
            SpawnOutcome::Injected(id) | SpawnOutcome::Skipped { entity: id, .. } => *id,
        }
    }

    pub fn is_injected(&self) -> bool {
        matches!(self, SpawnOutcome::Injected(_))
    }
}

/// Everything one tick's spawning produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchResult {
    pub tick:     Tick,
    /// Keys consumed on this tick.
    pub keys:     Vec<SpawnKey>,
    pub outcomes: Vec<SpawnOutcome>,
}

impl BatchResult {
    pub fn injected(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_injected()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.injected()
    }

    /// `true` when some requested pedestrian did not make it in.
    pub fn is_short(&self) -> bool {
        self.skipped() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn short_batch(&self, time: TimeOfDay) -> Option<ShortBatch> {
        self.is_short().then(|| ShortBatch {
            tick:      self.tick,
            time,
            requested: self.outcomes.len(),
            skipped:   self.skipped(),
        })
    }
}

/// A tick on which fewer pedestrians entered than the schedule asked for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShortBatch {
    pub tick:      Tick,
    pub time:      TimeOfDay,
    pub requested: usize,
    pub skipped:   usize,
}

// ── SpawnScheduler ────────────────────────────────────────────────────────────

/// Borrowed collaborators for one tick of spawning.
pub struct SpawnInputs<'a, O, S: ?Sized> {
    pub queue:     &'a SpawnQueue,
    pub buildings: &'a [Building],
    pub lengths:   &'a LaneLengthTable,
    pub client:    &'a mut RouteOracleClient<O>,
    pub stepper:   &'a mut S,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpawnScheduler {
    min_speed:    f64,
    max_speed:    f64,
    jitter_ticks: u64,
}

impl SpawnScheduler {
    pub fn new(config: &CampaignConfig) -> Self {
        Self {
            min_speed:    config.min_walking_speed,
            max_speed:    config.max_walking_speed,
            jitter_ticks: config.spawn_jitter_ticks,
        }
    }

    /// Spawn everything due at `time` (the time of day of `tick`).
    ///
    /// Only a stepper session fault is an error.
    pub fn spawn_tick<O: RouteOracle, S: Stepper + ?Sized>(
        &self,
        tick:   Tick,
        time:   TimeOfDay,
        inputs: SpawnInputs<'_, O, S>,
        ctx:    &mut RunContext,
        rng:    &mut SimRng,
    ) -> SimResult<BatchResult> {
        let SpawnInputs { queue, buildings, lengths, client, stepper } = inputs;
        let mut batch = BatchResult { tick, ..BatchResult::default() };

        let due: Vec<SpawnEvent> =
            queue.events_at(time).iter().filter(|e| !ctx.is_consumed(&e.key())).copied().collect();
        if due.is_empty() {
            return Ok(batch);
        }

        let mut planned: Vec<PedestrianEntity> = Vec::new();
        for event in &due {
            let origin = client.locate(event.origin);
            if let Err(e) = &origin {
                tracing::warn!(key = %event.key(), error = %e, "origin not locatable, skipping event");
            }
            for _ in 0..event.occupancy_count {
                let id = ctx.allocate_entity_id();
                let planned_one = match &origin {
                    Ok(origin) => self.plan(id, tick, event, *origin, buildings, lengths, client, rng),
                    Err(_) => Err(SkipReason::Unlocatable(event.origin)),
                };
                match planned_one {
                    Ok(entity) => planned.push(entity),
                    Err(reason) => batch.outcomes.push(SpawnOutcome::Skipped { entity: id, reason }),
                }
            }
            ctx.consume(event.key());
            batch.keys.push(event.key());
        }

        let commands: Vec<_> = planned.iter().map(PedestrianEntity::inject_command).collect();
        let mut results = stepper.inject_batch(&commands).into_iter();
        for entity in planned {
            match results.next() {
                Some(Ok(())) => {
                    batch.outcomes.push(SpawnOutcome::Injected(entity.id));
                    ctx.register(entity);
                }
                Some(Err(e)) if e.is_session_fault() => return Err(SimError::SessionFault(e.to_string())),
                Some(Err(e)) => {
                    tracing::warn!(entity = %entity.id, error = %e, "injection rejected");
                    batch.outcomes.push(SpawnOutcome::Skipped {
                        entity: entity.id,
                        reason: SkipReason::Rejected(e.to_string()),
                    });
                }
                None => {
                    tracing::warn!(entity = %entity.id, "stepper returned no injection result");
                    batch.outcomes.push(SpawnOutcome::Skipped {
                        entity: entity.id,
                        reason: SkipReason::Rejected("no injection result from stepper".into()),
                    });
                }
            }
        }

        ctx.record_skipped(batch.skipped());
        tracing::debug!(
            %tick,
            %time,
            events = batch.keys.len(),
            injected = batch.injected(),
            skipped = batch.skipped(),
            "spawn batch submitted"
        );
        Ok(batch)
    }

    #[allow(clippy::too_many_arguments)]
    fn plan<O: RouteOracle>(
        &self,
        id:        EntityId,
        tick:      Tick,
        event:     &SpawnEvent,
        origin:    EdgePosition,
        buildings: &[Building],
        lengths:   &LaneLengthTable,
        client:    &mut RouteOracleClient<O>,
        rng:       &mut SimRng,
    ) -> Result<PedestrianEntity, SkipReason> {
        let destination = rng.choose(buildings).ok_or(SkipReason::NoDestination)?;
        let target = client
            .locate(destination.location)
            .map_err(|_| SkipReason::Unlocatable(destination.location))?;
        let route = client.route_or_direct(origin.edge, target.edge, rng).edges;
        let speed = rng.gen_range(self.min_speed..=self.max_speed);
        let jitter = if self.jitter_ticks > 0 { rng.gen_range(0..self.jitter_ticks) } else { 0 };

        Ok(PedestrianEntity {
            id,
            origin_building:      event.building_id,
            destination_building: destination.id,
            origin_edge:          origin.edge,
            origin_offset:        origin.offset,
            destination_edge:     target.edge,
            destination_offset:   target.offset,
            planned_length:       lengths.route_length(&route),
            route,
            speed,
            departure_tick:       tick + jitter,
            lifecycle_state:      LifecycleState::Pending,
            reroute_count:        0,
        })
    }
}
