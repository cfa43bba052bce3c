//! The per-run tick loop.
//!
//! ```text
//! for tick in 0..horizon:
//!   ⓪ Drained?  — stepper has nobody live or pending and no unconsumed
//!                 spawn event departs before the horizon → stop.
//!   ① Spawn     — inject the pedestrians due at this tick's time of day.
//!   ② Step      — advance the stepper one tick.
//!   on sampling ticks only:
//!   ③ Sample    — telemetry, lifecycle sync, lane densities.
//!   ④ Reroute   — move entities off congested lanes.
//!   ⑤ Record    — one RunStatsSnapshot.
//! on stop, if the last stepped tick was not sampled:
//!   ③ + ⑤ once more for that tick, so late finishers are counted.
//! ```

use std::collections::BTreeSet;

use cf_core::{EntityId, LaneId, SimRng, Tick, TimeOfDay};
use cf_mobility::Stepper;
use cf_schedule::ScheduleSource;
use cf_spatial::RouteOracle;

use crate::{CampaignRunner, RunLabel, RunObserver, SimResult, SpawnInputs, collect_telemetry};

/// Why a run stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunEnd {
    /// The configured horizon was reached.
    Horizon,
    /// Nothing left to simulate before the horizon.
    Drained,
}

impl<Src, O, S> CampaignRunner<Src, O, S>
where
    Src: ScheduleSource,
    O: RouteOracle,
    S: Stepper,
{
    pub(crate) fn simulate<Obs: RunObserver + ?Sized>(
        &mut self,
        label:    &RunLabel,
        rng:      &mut SimRng,
        observer: &mut Obs,
    ) -> SimResult<RunEnd> {
        let end = self.config.run.end_tick();
        // Last stepped tick that no snapshot has covered yet.
        let mut unsampled: Option<Tick> = None;
        loop {
            let now = self.clock.current_tick;
            let time = self.clock.time_of_day();
            let stop = if now >= end {
                Some(RunEnd::Horizon)
            } else if self.is_drained(now, end, time) {
                Some(RunEnd::Drained)
            } else {
                None
            };
            if let Some(reason) = stop {
                if let Some(last) = unsampled {
                    let last_time = self.clock.time_of_day_at(last);
                    self.sample(last, last_time, label, rng, observer, false)?;
                }
                return Ok(reason);
            }

            // ── ① Spawn ───────────────────────────────────────────────────
            let inputs = SpawnInputs {
                queue:     &self.queue,
                buildings: &self.buildings,
                lengths:   self.monitor.lengths(),
                client:    &mut self.client,
                stepper:   &mut self.stepper,
            };
            let batch = self.scheduler.spawn_tick(now, time, inputs, &mut self.ctx, rng)?;
            if let Some(short) = batch.short_batch(time) {
                tracing::warn!(%now, %time, requested = short.requested, skipped = short.skipped, "short spawn batch");
                self.ctx.record_short_batch(short);
                observer.on_short_batch(label, &short);
            }

            // ── ② Step ────────────────────────────────────────────────────
            self.stepper.advance()?;
            unsampled = Some(now);

            if self.config.run.is_sampling_tick(now) {
                self.sample(now, time, label, rng, observer, true)?;
                unsampled = None;
            }
            self.clock.advance();
        }
    }

    fn is_drained(&self, now: Tick, end: Tick, time: TimeOfDay) -> bool {
        if self.stepper.expected_count() > 0 {
            return false;
        }
        let ctx = &self.ctx;
        !self.queue.has_pending_within(time, end.since(now), |key| ctx.is_consumed(key))
    }

    fn sample<Obs: RunObserver + ?Sized>(
        &mut self,
        now:      Tick,
        time:     TimeOfDay,
        label:    &RunLabel,
        rng:      &mut SimRng,
        observer: &mut Obs,
        reroute:  bool,
    ) -> SimResult<()> {
        // ── ③ Sample ──────────────────────────────────────────────────────
        let live_ids = self.stepper.live_entity_ids();
        let telemetry = collect_telemetry(&self.stepper, &live_ids)?;
        let live: BTreeSet<EntityId> = live_ids.into_iter().collect();
        let pending: BTreeSet<EntityId> = self.stepper.pending_entity_ids().into_iter().collect();
        self.ctx.sync_lifecycle(&live, &pending);

        let assignments: Vec<(EntityId, LaneId)> = telemetry.iter().map(|t| (t.id, t.lane)).collect();
        let congestion = self.monitor.sample(now, &assignments, &mut self.ctx.congested, &self.stepper);
        if !congestion.samples.is_empty() {
            observer.on_lane_densities(label, &congestion.samples);
        }

        // ── ④ Reroute ─────────────────────────────────────────────────────
        if reroute {
            self.rerouter.run(now, &assignments, &mut self.ctx, &mut self.client, &mut self.stepper, rng)?;
        }

        // ── ⑤ Record ──────────────────────────────────────────────────────
        let (snapshot, finished) = self.ctx.record_snapshot(now, time, &live, &telemetry, &congestion);
        for f in &finished {
            tracing::trace!(entity = %f.id, ticks = f.finish_tick.since(f.departure_tick), distance = f.distance, "finished");
        }
        observer.on_snapshot(label, &snapshot);
        Ok(())
    }
}
