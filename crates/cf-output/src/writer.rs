//! The `OutputWriter` trait implemented by all backend writers.

use cf_sim::RunLabel;

use crate::{LaneDensityRow, OutputResult, RunStatsRow, ShortBatchRow};

/// Trait implemented by CSV, SQLite, and Parquet writers.
///
/// Per-run records go between `begin_run` and `end_run`; writing them
/// outside a run fails with [`OutputError::NoOpenRun`][crate::OutputError::NoOpenRun].
/// Short batches are campaign-wide and may arrive at any time.
pub trait OutputWriter {
    /// Open the record series for `run`.  An unfinished previous run is
    /// ended first.
    fn begin_run(&mut self, run: &RunLabel) -> OutputResult<()>;

    fn write_stats(&mut self, row: &RunStatsRow) -> OutputResult<()>;

    fn write_lane_densities(&mut self, rows: &[LaneDensityRow]) -> OutputResult<()>;

    fn write_short_batch(&mut self, row: &ShortBatchRow) -> OutputResult<()>;

    /// Flush and close the current run's series.  A no-op without an open run.
    fn end_run(&mut self) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
