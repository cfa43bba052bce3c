//! `RunOutputObserver<W>` — bridges `RunObserver` to an `OutputWriter`.

use cf_core::TimeOfDay;
use cf_sim::{CampaignConfig, LaneDensitySample, RunLabel, RunObserver, RunStatsSnapshot, RunSummary, ShortBatch};

use crate::row::{LaneDensityRow, RunStatsRow, ShortBatchRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`RunObserver`] that writes run statistics, lane densities and short
/// batches to any [`OutputWriter`] backend (CSV, SQLite, Parquet, …).
///
/// Errors from the writer are stored internally because `RunObserver`
/// methods have no return value.  After `runner.run()` returns, call
/// [`finish`][Self::finish] or check [`take_error`][Self::take_error].
pub struct RunOutputObserver<W: OutputWriter> {
    writer:     W,
    start_time: TimeOfDay,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> RunOutputObserver<W> {
    /// Create an observer backed by `writer`, using `config` to turn lane
    /// sample ticks into times of day.
    pub fn new(writer: W, config: &CampaignConfig) -> Self {
        Self { writer, start_time: config.run.start_time_of_day, last_error: None }
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Close the writer; reports the first error of the whole campaign.
    pub fn finish(&mut self) -> OutputResult<()> {
        let result = self.writer.finish();
        self.store_err(result);
        self.take_error().map_or(Ok(()), Err)
    }

    /// Unwrap the inner writer (e.g. to inspect files after the campaign).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            tracing::warn!(error = %e, "output write failed");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> RunObserver for RunOutputObserver<W> {
    fn on_run_start(&mut self, run: &RunLabel) {
        let result = self.writer.begin_run(run);
        self.store_err(result);
    }

    fn on_snapshot(&mut self, _run: &RunLabel, snapshot: &RunStatsSnapshot) {
        let result = self.writer.write_stats(&RunStatsRow::from(snapshot));
        self.store_err(result);
    }

    fn on_lane_densities(&mut self, _run: &RunLabel, samples: &[LaneDensitySample]) {
        let rows: Vec<LaneDensityRow> = samples
            .iter()
            .map(|s| LaneDensityRow::new(s, self.start_time.after(s.tick.0)))
            .collect();
        if !rows.is_empty() {
            let result = self.writer.write_lane_densities(&rows);
            self.store_err(result);
        }
    }

    fn on_short_batch(&mut self, run: &RunLabel, batch: &ShortBatch) {
        let result = self.writer.write_short_batch(&ShortBatchRow::new(run, batch));
        self.store_err(result);
    }

    fn on_run_end(&mut self, _run: &RunLabel, _summary: &RunSummary) {
        let result = self.writer.end_run();
        self.store_err(result);
    }
}
