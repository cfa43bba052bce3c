//! Rerouting pedestrians off congested lanes.
//!
//! Runs once per sampling tick, after the congestion monitor.  Decisions are
//! made for every affected entity first and applied afterwards, so the
//! order entities are visited in never changes what the oracle is asked.
//!
//! For an entity on a congested lane:
//!
//! - the new route starts on the lane's edge and ends on the last edge of
//!   the entity's current route;
//! - a candidate that walks through another congested edge is replaced by
//!   one from a different routing mode when such an alternative exists;
//! - no candidate at all (oracle failures, empty answers) keeps the current
//!   route;
//! - a candidate equal to the remaining route is not re-applied.
//!
//! Each entity is rerouted at most `max_reroutes_per_entity` times per run,
//! and entities already on their destination edge are left alone.

use cf_core::{EdgeId, EntityId, LaneId, SimRng, Tick};
use cf_mobility::Stepper;
use cf_spatial::{RouteOracle, RouteOracleClient, RoutingMode};

use crate::{CampaignConfig, CongestedLaneSet, RunContext, SimError, SimResult};

/// A route change chosen for one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct RerouteDecision {
    pub entity:         EntityId,
    pub lane:           LaneId,
    pub route:          Vec<EdgeId>,
    pub arrival_offset: f64,
}

/// Per-sample counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RerouteReport {
    /// Entities found on a congested lane.
    pub considered:     usize,
    pub applied:        usize,
    /// No usable candidate; the route was kept.
    pub kept:           usize,
    /// The candidate matched the remaining route.
    pub unchanged:      usize,
    /// Already on the destination edge.
    pub at_destination: usize,
    /// Reroute budget used up.
    pub exhausted:      usize,
    /// `set_route` rejected by the stepper.
    pub faults:         usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReroutingController {
    max_reroutes: u32,
}

impl ReroutingController {
    pub fn new(config: &CampaignConfig) -> Self {
        Self { max_reroutes: config.max_reroutes_per_entity }
    }

    /// Decide and apply for every entity in `assignments` standing on a
    /// congested lane.
    pub fn run<O: RouteOracle, S: Stepper + ?Sized>(
        &self,
        tick:        Tick,
        assignments: &[(EntityId, LaneId)],
        ctx:         &mut RunContext,
        client:      &mut RouteOracleClient<O>,
        stepper:     &mut S,
        rng:         &mut SimRng,
    ) -> SimResult<RerouteReport> {
        let (decisions, mut report) = self.decide(assignments, ctx, client, rng);
        self.apply(decisions, ctx, stepper, &mut report)?;
        if report.considered > 0 {
            tracing::debug!(
                %tick,
                considered = report.considered,
                applied = report.applied,
                kept = report.kept,
                "reroute pass"
            );
        }
        Ok(report)
    }

    /// Choose new routes without touching the stepper.
    pub fn decide<O: RouteOracle>(
        &self,
        assignments: &[(EntityId, LaneId)],
        ctx:         &RunContext,
        client:      &mut RouteOracleClient<O>,
        rng:         &mut SimRng,
    ) -> (Vec<RerouteDecision>, RerouteReport) {
        let mut report = RerouteReport::default();
        let mut decisions = Vec::new();

        for &(id, lane) in assignments {
            if !ctx.congested.contains(lane) {
                continue;
            }
            let Some(entity) = ctx.entity(id) else { continue };
            report.considered += 1;

            if entity.reroute_count >= self.max_reroutes {
                report.exhausted += 1;
                continue;
            }
            let current = lane.edge;
            let Some(&destination) = entity.route.last() else { continue };
            if current == destination {
                report.at_destination += 1;
                continue;
            }

            let Some(route) = choose_route(current, destination, &ctx.congested, client, rng) else {
                tracing::debug!(entity = %id, %lane, "no reroute candidate, keeping route");
                report.kept += 1;
                continue;
            };
            if entity.remaining_from(current) == Some(route.as_slice()) {
                report.unchanged += 1;
                continue;
            }
            decisions.push(RerouteDecision {
                entity: id,
                lane,
                route,
                arrival_offset: entity.destination_offset,
            });
        }
        (decisions, report)
    }

    /// Hand decisions to the stepper.  A rejected `set_route` leaves the
    /// entity on its old route.
    pub fn apply<S: Stepper + ?Sized>(
        &self,
        decisions: Vec<RerouteDecision>,
        ctx:       &mut RunContext,
        stepper:   &mut S,
        report:    &mut RerouteReport,
    ) -> SimResult<()> {
        for d in decisions {
            match stepper.set_route(d.entity, &d.route, d.arrival_offset) {
                Ok(()) => {
                    if let Some(entity) = ctx.entity_mut(d.entity) {
                        entity.route = d.route;
                        entity.reroute_count += 1;
                    }
                    ctx.record_reroute();
                    report.applied += 1;
                }
                Err(e) if e.is_session_fault() => return Err(SimError::SessionFault(e.to_string())),
                Err(e) => {
                    tracing::warn!(entity = %d.entity, error = %e, "set_route rejected, keeping route");
                    report.faults += 1;
                }
            }
        }
        Ok(())
    }
}

/// First candidate from the client; if it walks through congestion, the
/// first other mode that avoids it, else the original candidate.
fn choose_route<O: RouteOracle>(
    current:     EdgeId,
    destination: EdgeId,
    congested:   &CongestedLaneSet,
    client:      &mut RouteOracleClient<O>,
    rng:         &mut SimRng,
) -> Option<Vec<EdgeId>> {
    let first = client.try_route(current, destination, rng)?;
    if !congested.blocks_route(&first.edges) {
        return Some(first.edges);
    }
    RoutingMode::ALL
        .into_iter()
        .filter(|&m| Some(m) != first.mode)
        .find_map(|m| client.route_with_mode(current, destination, m).filter(|r| !congested.blocks_route(r)))
        .or(Some(first.edges))
}
