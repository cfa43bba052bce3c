//! Plain data row types written by output backends.

use cf_core::TimeOfDay;
use cf_sim::{LaneDensitySample, RunLabel, RunStatsSnapshot, ShortBatch};

/// One sampling tick of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatsRow {
    pub tick:                u64,
    /// `HH:MM:SS`.
    pub time:                String,
    pub live_count:          u64,
    pub mean_speed:          f64,
    pub waiting_count:       u64,
    pub avg_route_time:      f64,
    pub throughput:          u64,
    pub max_density:         f64,
    /// Empty when no lane was occupied.
    pub max_density_lane:    String,
    pub max_density_lat:     f64,
    pub max_density_lon:     f64,
    pub max_wait_time:       f64,
    pub total_distance:      f64,
    pub avg_distance:        f64,
    pub avg_route_deviation: f64,
    pub congested_lanes:     u64,
}

impl From<&RunStatsSnapshot> for RunStatsRow {
    fn from(s: &RunStatsSnapshot) -> Self {
        Self {
            tick:                s.tick.0,
            time:                s.time.to_string(),
            live_count:          s.live_count as u64,
            mean_speed:          s.mean_speed,
            waiting_count:       s.waiting_count as u64,
            avg_route_time:      s.avg_route_time,
            throughput:          s.throughput as u64,
            max_density:         s.max_density,
            max_density_lane:    s.max_density_lane.map(|l| l.to_string()).unwrap_or_default(),
            max_density_lat:     s.max_density_lat,
            max_density_lon:     s.max_density_lon,
            max_wait_time:       s.max_wait_time,
            total_distance:      s.total_distance,
            avg_distance:        s.avg_distance,
            avg_route_deviation: s.avg_route_deviation,
            congested_lanes:     s.congested_lanes as u64,
        }
    }
}

/// One lane at or above the report threshold on one sampling tick.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneDensityRow {
    pub tick:             u64,
    pub time:             String,
    pub lane:             String,
    pub pedestrian_count: u32,
    pub length:           f64,
    pub density:          f64,
    /// `None` when the stepper has no geometry for the lane.
    pub lat:              Option<f64>,
    pub lon:              Option<f64>,
}

impl LaneDensityRow {
    pub fn new(sample: &LaneDensitySample, time: TimeOfDay) -> Self {
        Self {
            tick:             sample.tick.0,
            time:             time.to_string(),
            lane:             sample.lane.to_string(),
            pedestrian_count: sample.pedestrian_count,
            length:           sample.length,
            density:          sample.density,
            lat:              sample.location.map(|p| p.lat),
            lon:              sample.location.map(|p| p.lon),
        }
    }
}

/// A tick on which some scheduled pedestrians were not injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortBatchRow {
    pub day_type:   String,
    pub run_number: u32,
    pub tick:       u64,
    pub time:       String,
    pub requested:  u64,
    pub skipped:    u64,
}

impl ShortBatchRow {
    pub fn new(run: &RunLabel, batch: &ShortBatch) -> Self {
        Self {
            day_type:   run.day_type.to_string(),
            run_number: run.run_number,
            tick:       batch.tick.0,
            time:       batch.time.to_string(),
            requested:  batch.requested as u64,
            skipped:    batch.skipped as u64,
        }
    }
}
