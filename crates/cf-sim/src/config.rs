//! Campaign configuration.
//!
//! Every field has a default, so a JSON file only needs the values it
//! changes:
//!
//! ```json
//! { "runs_per_day_type": 5, "congestion_threshold": 3.0,
//!   "run": { "sampling_interval_ticks": 30 } }
//! ```

use serde::{Deserialize, Serialize};

use cf_core::RunConfig;
use cf_schedule::DayType;
use cf_spatial::{ClientConfig, ModeWeights};

use crate::{SimError, SimResult};

/// What happens to a congested lane once its crowd thins out.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CongestionPolicy {
    /// Once congested, congested for the rest of the run.
    #[default]
    Sticky,
    /// A lane leaves the set on a sampling tick where its density is below
    /// `clear_below`.
    Decay { clear_below: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Horizon, sampling interval, start time and seed of every run.
    pub run: RunConfig,

    /// Repetitions per day type.  Default: 30.
    pub runs_per_day_type: u32,

    /// Day types in the order they are simulated.
    pub day_types: Vec<DayType>,

    /// Pedestrians per metre above which a lane joins the congested set.
    /// Default: 2.5.
    pub congestion_threshold: f64,

    pub congestion_policy: CongestionPolicy,

    /// Lanes at or above this density go to the lane-density log.
    /// Default: 2.0.
    pub report_threshold: f64,

    /// Walking speed range in m/s; each pedestrian draws uniformly from it.
    pub min_walking_speed: f64,
    pub max_walking_speed: f64,

    /// Departures are spread over `[tick, tick + spawn_jitter_ticks)`.
    /// Zero departs everyone on the spawn tick.  Default: the sampling
    /// interval.
    pub spawn_jitter_ticks: u64,

    pub mode_weights: ModeWeights,

    /// Snapping cache size, rounding precision and route attempts.
    pub client: ClientConfig,

    /// Reroutes allowed per pedestrian per run.  Default: 3.
    pub max_reroutes_per_entity: u32,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        let run = RunConfig::default();
        Self {
            spawn_jitter_ticks:      run.sampling_interval_ticks,
            run,
            runs_per_day_type:       30,
            day_types:               DayType::ROTATION.to_vec(),
            congestion_threshold:    2.5,
            congestion_policy:       CongestionPolicy::Sticky,
            report_threshold:        2.0,
            min_walking_speed:       0.7,
            max_walking_speed:       2.0,
            mode_weights:            ModeWeights::default(),
            client:                  ClientConfig::default(),
            max_reroutes_per_entity: 3,
        }
    }
}

impl CampaignConfig {
    /// Total runs the campaign will execute.
    pub fn total_runs(&self) -> u64 {
        self.day_types.len() as u64 * self.runs_per_day_type as u64
    }

    pub fn validate(&self) -> SimResult<()> {
        self.run.validate()?;

        let bad = |msg: String| Err(SimError::Config(msg));
        if self.runs_per_day_type == 0 {
            return bad("runs_per_day_type must be > 0".into());
        }
        if self.day_types.is_empty() {
            return bad("day_types must not be empty".into());
        }
        if !(self.congestion_threshold.is_finite() && self.congestion_threshold > 0.0) {
            return bad(format!("congestion_threshold must be > 0, got {}", self.congestion_threshold));
        }
        if !(self.report_threshold.is_finite() && self.report_threshold >= 0.0) {
            return bad(format!("report_threshold must be >= 0, got {}", self.report_threshold));
        }
        if let CongestionPolicy::Decay { clear_below } = self.congestion_policy {
            if !(clear_below.is_finite() && clear_below >= 0.0 && clear_below <= self.congestion_threshold) {
                return bad(format!(
                    "decay clear_below must lie in [0, {}], got {clear_below}",
                    self.congestion_threshold
                ));
            }
        }
        let (lo, hi) = (self.min_walking_speed, self.max_walking_speed);
        if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi) {
            return bad(format!("walking speed range [{lo}, {hi}] is invalid"));
        }
        if self.spawn_jitter_ticks > self.run.sampling_interval_ticks {
            return bad(format!(
                "spawn_jitter_ticks ({}) exceeds the sampling interval ({})",
                self.spawn_jitter_ticks, self.run.sampling_interval_ticks
            ));
        }
        if self.client.max_attempts == 0 {
            return bad("client.max_attempts must be > 0".into());
        }
        if self.client.locate_cache_capacity == 0 {
            return bad("client.locate_cache_capacity must be > 0".into());
        }
        self.mode_weights.validate().map_err(|e| SimError::Config(e.to_string()))
    }
}
