//! Congestion sampling.
//!
//! On every sampling tick the monitor turns the live entity → lane
//! assignments into per-lane densities (pedestrians per metre of lane),
//! updates the run's [`CongestedLaneSet`] and picks the densest lane.
//!
//! # Lane lengths
//!
//! Lengths come from a table built once per run from the stepper
//! ([`LaneLengthTable::from_stepper`]).  A lane missing from the table, or
//! with a non-positive length, counts as 1 m, so its density equals its
//! head count.

use std::collections::BTreeSet;

use cf_core::{EdgeId, EntityId, GeoPoint, LaneId, Tick};
use cf_mobility::Stepper;

use crate::{CampaignConfig, CongestionPolicy};

#[cfg(feature = "fx-hash")]
type LaneMap<V> = rustc_hash::FxHashMap<LaneId, V>;
#[cfg(not(feature = "fx-hash"))]
type LaneMap<V> = std::collections::HashMap<LaneId, V>;

// ── LaneLengthTable ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct LaneLengthTable {
    lengths: LaneMap<f64>,
}

impl LaneLengthTable {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (LaneId, f64)>) -> Self {
        Self { lengths: pairs.into_iter().collect() }
    }

    /// Ask the stepper for every lane it knows.  Lanes it cannot measure are
    /// left out and fall back to 1 m.
    pub fn from_stepper<S: Stepper + ?Sized>(stepper: &S) -> Self {
        let lanes = stepper.lane_ids();
        let table = Self::from_pairs(
            lanes.iter().filter_map(|&lane| stepper.lane_length(lane).map(|len| (lane, len))),
        );
        tracing::debug!(lanes = lanes.len(), measured = table.len(), "lane length table built");
        table
    }

    /// Length used for density; never zero.
    pub fn length(&self, lane: LaneId) -> f64 {
        match self.lengths.get(&lane) {
            Some(&len) if len > 0.0 => len,
            _ => 1.0,
        }
    }

    /// Sum of primary-lane lengths along `route`.
    pub fn route_length(&self, route: &[EdgeId]) -> f64 {
        route.iter().map(|&e| self.length(LaneId::primary(e))).sum()
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

// ── CongestedLaneSet ──────────────────────────────────────────────────────────

/// Lanes whose density exceeded the threshold during the current run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CongestedLaneSet {
    lanes: BTreeSet<LaneId>,
}

impl CongestedLaneSet {
    pub fn contains(&self, lane: LaneId) -> bool {
        self.lanes.contains(&lane)
    }

    /// `true` if any lane of `edge` is congested.
    pub fn touches_edge(&self, edge: EdgeId) -> bool {
        self.lanes
            .range(LaneId::new(edge, 0)..=LaneId::new(edge, u16::MAX))
            .next()
            .is_some()
    }

    /// `true` if any edge of `route` after the first is congested.
    pub fn blocks_route(&self, route: &[EdgeId]) -> bool {
        route.iter().skip(1).any(|&e| self.touches_edge(e))
    }

    pub fn insert(&mut self, lane: LaneId) -> bool {
        self.lanes.insert(lane)
    }

    pub fn remove(&mut self, lane: LaneId) -> bool {
        self.lanes.remove(&lane)
    }

    pub fn is_superset(&self, other: &CongestedLaneSet) -> bool {
        self.lanes.is_superset(&other.lanes)
    }

    pub fn iter(&self) -> impl Iterator<Item = LaneId> + '_ {
        self.lanes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn clear(&mut self) {
        self.lanes.clear();
    }
}

// ── Samples and reports ───────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct LaneDensitySample {
    pub lane:             LaneId,
    pub tick:             Tick,
    pub pedestrian_count: u32,
    pub length:           f64,
    pub density:          f64,
    /// First shape point of the lane, when the stepper knows it.
    pub location:         Option<GeoPoint>,
}

/// Outcome of one sampling tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CongestionReport {
    /// Occupied lanes with their head counts, in first-seen order.
    pub counts:          Vec<(LaneId, u32)>,
    /// Densest lane; ties go to the lane seen first.
    pub max:             Option<LaneDensitySample>,
    /// Lanes at or above the report threshold, in first-seen order.
    pub samples:         Vec<LaneDensitySample>,
    /// Lanes that joined the congested set on this tick.
    pub added:           Vec<LaneId>,
    /// Lanes the decay policy removed on this tick.
    pub cleared:         Vec<LaneId>,
    /// Size of the congested set after this tick.
    pub congested_total: usize,
}

impl CongestionReport {
    pub fn max_density(&self) -> f64 {
        self.max.as_ref().map_or(0.0, |s| s.density)
    }
}

// ── CongestionMonitor ─────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct CongestionMonitor {
    threshold:        f64,
    report_threshold: f64,
    policy:           CongestionPolicy,
    lengths:          LaneLengthTable,
}

impl CongestionMonitor {
    pub fn new(config: &CampaignConfig) -> Self {
        Self {
            threshold:        config.congestion_threshold,
            report_threshold: config.report_threshold,
            policy:           config.congestion_policy,
            lengths:          LaneLengthTable::default(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Rebuild the lane length table.  Called once per run, after the
    /// stepper session opens.
    pub fn prepare<S: Stepper + ?Sized>(&mut self, stepper: &S) {
        self.lengths = LaneLengthTable::from_stepper(stepper);
    }

    pub fn set_lengths(&mut self, lengths: LaneLengthTable) {
        self.lengths = lengths;
    }

    pub fn lengths(&self) -> &LaneLengthTable {
        &self.lengths
    }

    /// Sample one tick.  `assignments` are the live entities with a known
    /// lane, in the order the stepper listed them.
    pub fn sample<S: Stepper + ?Sized>(
        &self,
        tick:        Tick,
        assignments: &[(EntityId, LaneId)],
        congested:   &mut CongestedLaneSet,
        stepper:     &S,
    ) -> CongestionReport {
        let mut counts: Vec<(LaneId, u32)> = Vec::new();
        let mut slot: LaneMap<usize> = LaneMap::default();
        for &(_, lane) in assignments {
            let i = *slot.entry(lane).or_insert_with(|| {
                counts.push((lane, 0));
                counts.len() - 1
            });
            counts[i].1 += 1;
        }

        let mut report = CongestionReport::default();
        let mut max: Option<(LaneId, u32, f64, f64)> = None;
        for &(lane, count) in &counts {
            let length = self.lengths.length(lane);
            let density = count as f64 / length;

            if density > self.threshold && congested.insert(lane) {
                report.added.push(lane);
            }
            if density >= self.report_threshold {
                report.samples.push(LaneDensitySample {
                    lane,
                    tick,
                    pedestrian_count: count,
                    length,
                    density,
                    location: stepper.lane_geo(lane),
                });
            }
            if max.is_none_or(|(_, _, _, best)| density > best) {
                max = Some((lane, count, length, density));
            }
        }

        if let CongestionPolicy::Decay { clear_below } = self.policy {
            let density_of = |lane: LaneId| {
                slot.get(&lane).map_or(0.0, |&i| counts[i].1 as f64 / self.lengths.length(lane))
            };
            let stale: Vec<LaneId> = congested.iter().filter(|&l| density_of(l) < clear_below).collect();
            for lane in stale {
                congested.remove(lane);
                report.cleared.push(lane);
            }
        }

        report.max = max.map(|(lane, count, length, density)| LaneDensitySample {
            lane,
            tick,
            pedestrian_count: count,
            length,
            density,
            location: stepper.lane_geo(lane),
        });
        if !report.added.is_empty() {
            tracing::debug!(%tick, added = report.added.len(), total = congested.len(), "lanes congested");
        }
        report.counts = counts;
        report.congested_total = congested.len();
        report
    }
}
