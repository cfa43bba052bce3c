//! CSV output backend.
//!
//! Creates, in the configured output directory:
//! - `short_batches.csv`, opened with the writer;
//! - `<run>_stats.csv` and `<run>_lanes.csv` for every run.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;

use cf_sim::RunLabel;

use crate::writer::OutputWriter;
use crate::{LaneDensityRow, OutputError, OutputResult, RunStatsRow, ShortBatchRow};

pub const STATS_HEADER: [&str; 16] = [
    "tick",
    "time",
    "live_count",
    "mean_speed",
    "waiting_count",
    "avg_route_time",
    "throughput",
    "max_density",
    "max_density_lane",
    "max_density_lat",
    "max_density_lon",
    "max_wait_time",
    "total_distance",
    "avg_distance",
    "avg_route_deviation",
    "congested_lanes",
];

pub const LANES_HEADER: [&str; 8] =
    ["tick", "time", "lane", "pedestrian_count", "length", "density", "lat", "lon"];

pub const SHORT_BATCH_HEADER: [&str; 6] = ["day_type", "run_number", "tick", "time", "requested", "skipped"];

struct RunFiles {
    stats: Writer<File>,
    lanes: Writer<File>,
}

/// Writes campaign output to CSV files, two per run.
pub struct CsvWriter {
    dir:           PathBuf,
    run:           Option<RunFiles>,
    short_batches: Writer<File>,
    finished:      bool,
}

impl CsvWriter {
    /// Create `short_batches.csv` in `dir` and write its header row.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut short_batches = Writer::from_path(dir.join("short_batches.csv"))?;
        short_batches.write_record(SHORT_BATCH_HEADER)?;
        Ok(Self { dir: dir.to_path_buf(), run: None, short_batches, finished: false })
    }

    pub fn stats_path(&self, run: &RunLabel) -> PathBuf {
        self.dir.join(format!("{run}_stats.csv"))
    }

    pub fn lanes_path(&self, run: &RunLabel) -> PathBuf {
        self.dir.join(format!("{run}_lanes.csv"))
    }

    fn run_files(&mut self) -> OutputResult<&mut RunFiles> {
        self.run.as_mut().ok_or(OutputError::NoOpenRun)
    }
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

impl OutputWriter for CsvWriter {
    fn begin_run(&mut self, run: &RunLabel) -> OutputResult<()> {
        self.end_run()?;
        let mut stats = Writer::from_path(self.stats_path(run))?;
        stats.write_record(STATS_HEADER)?;
        let mut lanes = Writer::from_path(self.lanes_path(run))?;
        lanes.write_record(LANES_HEADER)?;
        self.run = Some(RunFiles { stats, lanes });
        Ok(())
    }

    fn write_stats(&mut self, row: &RunStatsRow) -> OutputResult<()> {
        let files = self.run_files()?;
        files.stats.write_record(&[
            row.tick.to_string(),
            row.time.clone(),
            row.live_count.to_string(),
            row.mean_speed.to_string(),
            row.waiting_count.to_string(),
            row.avg_route_time.to_string(),
            row.throughput.to_string(),
            row.max_density.to_string(),
            row.max_density_lane.clone(),
            row.max_density_lat.to_string(),
            row.max_density_lon.to_string(),
            row.max_wait_time.to_string(),
            row.total_distance.to_string(),
            row.avg_distance.to_string(),
            row.avg_route_deviation.to_string(),
            row.congested_lanes.to_string(),
        ])?;
        Ok(())
    }

    fn write_lane_densities(&mut self, rows: &[LaneDensityRow]) -> OutputResult<()> {
        let files = self.run_files()?;
        for row in rows {
            files.lanes.write_record(&[
                row.tick.to_string(),
                row.time.clone(),
                row.lane.clone(),
                row.pedestrian_count.to_string(),
                row.length.to_string(),
                row.density.to_string(),
                opt(row.lat),
                opt(row.lon),
            ])?;
        }
        Ok(())
    }

    fn write_short_batch(&mut self, row: &ShortBatchRow) -> OutputResult<()> {
        self.short_batches.write_record(&[
            row.day_type.clone(),
            row.run_number.to_string(),
            row.tick.to_string(),
            row.time.clone(),
            row.requested.to_string(),
            row.skipped.to_string(),
        ])?;
        Ok(())
    }

    fn end_run(&mut self) -> OutputResult<()> {
        if let Some(mut files) = self.run.take() {
            files.stats.flush()?;
            files.lanes.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.end_run()?;
        self.short_batches.flush()?;
        Ok(())
    }
}
