//! Per-interval run statistics.
//!
//! # Tracking
//!
//! Every live entity seen on a sampling tick gets a tracking entry holding
//! its departure tick, last sampled position and accumulated distance.  The
//! distance grows by the straight-line delta between consecutive samples,
//! so it never decreases.
//!
//! An entity is finished when it was tracked on an earlier sample but is not
//! live now.  Its elapsed ticks and distance join the running aggregates and
//! its entry is evicted.
//!
//! # Aggregates
//!
//! `avg_route_time`, `total_distance` and `avg_distance` are cumulative over
//! the run; `throughput` counts the entities finished on this sample only.

use std::collections::{BTreeMap, BTreeSet};

use cf_core::{EntityId, LaneId, Position, Tick, TimeOfDay};

use crate::{CongestionReport, EntityTelemetry, PedestrianEntity};

#[derive(Clone, Debug, PartialEq)]
pub struct RunStatsSnapshot {
    pub tick:                Tick,
    pub time:                TimeOfDay,
    pub live_count:          usize,
    /// m/s over the sampled live entities; 0 when none.
    pub mean_speed:          f64,
    /// Live entities with a non-zero waiting time.
    pub waiting_count:       usize,
    /// Mean ticks from departure to finish over every finished entity.
    pub avg_route_time:      f64,
    /// Entities finished since the previous sample.
    pub throughput:          usize,
    pub max_density:         f64,
    pub max_density_lane:    Option<LaneId>,
    /// Location of the densest lane; 0 when unknown.
    pub max_density_lat:     f64,
    pub max_density_lon:     f64,
    /// Longest current waiting time in seconds.
    pub max_wait_time:       f64,
    /// Metres walked by every finished entity.
    pub total_distance:      f64,
    pub avg_distance:        f64,
    /// Mean `distance_traveled / planned_length` over live entities with a
    /// known plan; 1 when there are none.
    pub avg_route_deviation: f64,
    pub congested_lanes:     usize,
}

/// An entity the aggregator saw finish.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FinishedEntity {
    pub id:             EntityId,
    pub departure_tick: Tick,
    pub finish_tick:    Tick,
    pub distance:       f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrackedEntity {
    pub departure_tick:    Tick,
    pub last_position:     Position,
    pub distance_traveled: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatsAggregator {
    tracking:        BTreeMap<EntityId, TrackedEntity>,
    route_time_sum:  u64,
    finished_count:  u64,
    distance_sum:    f64,
    samples:         u64,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracked(&self, id: EntityId) -> Option<&TrackedEntity> {
        self.tracking.get(&id)
    }

    pub fn tracked_count(&self) -> usize {
        self.tracking.len()
    }

    pub fn finished_count(&self) -> u64 {
        self.finished_count
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Record one sampling tick.
    ///
    /// `live` is every id the stepper reports live; `telemetry` the subset it
    /// could describe.  `entities` supplies departure ticks and planned
    /// lengths; `congestion` the densest lane and the congested set size.
    pub fn record(
        &mut self,
        tick:       Tick,
        time:       TimeOfDay,
        live:       &BTreeSet<EntityId>,
        telemetry:  &[EntityTelemetry],
        entities:   &BTreeMap<EntityId, PedestrianEntity>,
        congestion: &CongestionReport,
    ) -> (RunStatsSnapshot, Vec<FinishedEntity>) {
        self.samples += 1;

        // ── Distance ──────────────────────────────────────────────────────
        for t in telemetry {
            match self.tracking.get_mut(&t.id) {
                Some(tracked) => {
                    tracked.distance_traveled += tracked.last_position.distance(t.position);
                    tracked.last_position = t.position;
                }
                None => {
                    let departure_tick = entities
                        .get(&t.id)
                        .map_or(tick, |e| e.departure_tick.min(tick));
                    self.tracking.insert(t.id, TrackedEntity {
                        departure_tick,
                        last_position: t.position,
                        distance_traveled: 0.0,
                    });
                }
            }
        }

        // ── Finished: tracked but no longer live ──────────────────────────
        let gone: Vec<EntityId> = self.tracking.keys().filter(|id| !live.contains(id)).copied().collect();
        let mut finished = Vec::with_capacity(gone.len());
        for id in gone {
            if let Some(tracked) = self.tracking.remove(&id) {
                self.route_time_sum += tick.since(tracked.departure_tick);
                self.distance_sum += tracked.distance_traveled;
                self.finished_count += 1;
                finished.push(FinishedEntity {
                    id,
                    departure_tick: tracked.departure_tick,
                    finish_tick:    tick,
                    distance:       tracked.distance_traveled,
                });
            }
        }

        // ── Snapshot ──────────────────────────────────────────────────────
        let n = telemetry.len();
        let mean_speed = if n > 0 { telemetry.iter().map(|t| t.speed).sum::<f64>() / n as f64 } else { 0.0 };
        let max_wait_time = telemetry.iter().map(|t| t.waiting_time).fold(0.0, f64::max);

        let mut deviations = 0.0;
        let mut planned = 0usize;
        for t in telemetry {
            let plan = entities.get(&t.id).map_or(0.0, |e| e.planned_length);
            if let (Some(tracked), true) = (self.tracking.get(&t.id), plan > 0.0) {
                deviations += tracked.distance_traveled / plan;
                planned += 1;
            }
        }

        let finished_f = self.finished_count as f64;
        let location = congestion.max.as_ref().and_then(|m| m.location);
        let snapshot = RunStatsSnapshot {
            tick,
            time,
            live_count:          live.len(),
            mean_speed,
            waiting_count:       telemetry.iter().filter(|t| t.waiting_time > 0.0).count(),
            avg_route_time:      if finished_f > 0.0 { self.route_time_sum as f64 / finished_f } else { 0.0 },
            throughput:          finished.len(),
            max_density:         congestion.max_density(),
            max_density_lane:    congestion.max.as_ref().map(|m| m.lane),
            max_density_lat:     location.map_or(0.0, |g| g.lat),
            max_density_lon:     location.map_or(0.0, |g| g.lon),
            max_wait_time,
            total_distance:      self.distance_sum,
            avg_distance:        if finished_f > 0.0 { self.distance_sum / finished_f } else { 0.0 },
            avg_route_deviation: if planned > 0 { deviations / planned as f64 } else { 1.0 },
            congested_lanes:     congestion.congested_total,
        };
        (snapshot, finished)
    }
}
