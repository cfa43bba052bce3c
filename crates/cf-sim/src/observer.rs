//! Campaign observer trait for progress reporting and data collection.

use std::fmt;

use cf_schedule::DayType;

use crate::{LaneDensitySample, RunStatsSnapshot, RunSummary, ShortBatch};

/// Identity of one run: every record it produces is tagged with this.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunLabel {
    pub day_type:   DayType,
    /// 1-based within the day type.
    pub run_number: u32,
}

impl fmt::Display for RunLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_run{:02}", self.day_type, self.run_number)
    }
}

/// Callbacks invoked by the [`CampaignRunner`][crate::CampaignRunner] at key
/// points of each run.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct Progress;
///
/// impl RunObserver for Progress {
///     fn on_run_end(&mut self, run: &RunLabel, summary: &RunSummary) {
///         println!("{run}: {} injected, ended at {}", summary.injected, summary.end_tick);
///     }
/// }
/// ```
pub trait RunObserver {
    /// Called after the stepper session opens, before the first tick.
    fn on_run_start(&mut self, _run: &RunLabel) {}

    /// Called once per sampling tick with that interval's statistics.
    fn on_snapshot(&mut self, _run: &RunLabel, _snapshot: &RunStatsSnapshot) {}

    /// Called on sampling ticks where some lane reached the report
    /// threshold.
    fn on_lane_densities(&mut self, _run: &RunLabel, _samples: &[LaneDensitySample]) {}

    /// Called for every tick whose spawn batch lost pedestrians.
    fn on_short_batch(&mut self, _run: &RunLabel, _batch: &ShortBatch) {}

    /// Called once per run after the session is closed, including runs that
    /// aborted (`summary.aborted` is then set).  Writers flush here.
    fn on_run_end(&mut self, _run: &RunLabel, _summary: &RunSummary) {}
}

/// A [`RunObserver`] that does nothing.
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

impl<T: RunObserver + ?Sized> RunObserver for &mut T {
    fn on_run_start(&mut self, run: &RunLabel) {
        (**self).on_run_start(run)
    }

    fn on_snapshot(&mut self, run: &RunLabel, snapshot: &RunStatsSnapshot) {
        (**self).on_snapshot(run, snapshot)
    }

    fn on_lane_densities(&mut self, run: &RunLabel, samples: &[LaneDensitySample]) {
        (**self).on_lane_densities(run, samples)
    }

    fn on_short_batch(&mut self, run: &RunLabel, batch: &ShortBatch) {
        (**self).on_short_batch(run, batch)
    }

    fn on_run_end(&mut self, run: &RunLabel, summary: &RunSummary) {
        (**self).on_run_end(run, summary)
    }
}
