//! Parquet output backend (feature `parquet`).
//!
//! Creates, in the configured output directory:
//! - `<run>_stats.parquet` and `<run>_lanes.parquet` for every run;
//! - `short_batches.parquet`, written by `finish()`.
//!
//! Stats rows are buffered and written as one record batch when the run
//! ends; lane rows are written one batch per sampling tick.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Float64Builder, StringBuilder, UInt32Builder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use cf_sim::RunLabel;

use crate::writer::OutputWriter;
use crate::{LaneDensityRow, OutputError, OutputResult, RunStatsRow, ShortBatchRow};

fn stats_schema() -> Arc<Schema> {
    let f64_col = |name: &str| Field::new(name, DataType::Float64, false);
    Arc::new(Schema::new(vec![
        Field::new("tick",             DataType::UInt64, false),
        Field::new("time",             DataType::Utf8,   false),
        Field::new("live_count",       DataType::UInt64, false),
        f64_col("mean_speed"),
        Field::new("waiting_count",    DataType::UInt64, false),
        f64_col("avg_route_time"),
        Field::new("throughput",       DataType::UInt64, false),
        f64_col("max_density"),
        Field::new("max_density_lane", DataType::Utf8,   false),
        f64_col("max_density_lat"),
        f64_col("max_density_lon"),
        f64_col("max_wait_time"),
        f64_col("total_distance"),
        f64_col("avg_distance"),
        f64_col("avg_route_deviation"),
        Field::new("congested_lanes",  DataType::UInt64, false),
    ]))
}

fn lanes_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("tick",             DataType::UInt64,  false),
        Field::new("time",             DataType::Utf8,    false),
        Field::new("lane",             DataType::Utf8,    false),
        Field::new("pedestrian_count", DataType::UInt32,  false),
        Field::new("length",           DataType::Float64, false),
        Field::new("density",          DataType::Float64, false),
        Field::new("lat",              DataType::Float64, true),
        Field::new("lon",              DataType::Float64, true),
    ]))
}

fn short_batch_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("day_type",   DataType::Utf8,   false),
        Field::new("run_number", DataType::UInt32, false),
        Field::new("tick",       DataType::UInt64, false),
        Field::new("time",       DataType::Utf8,   false),
        Field::new("requested",  DataType::UInt64, false),
        Field::new("skipped",    DataType::UInt64, false),
    ]))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

fn open(path: PathBuf, schema: &Arc<Schema>) -> OutputResult<ArrowWriter<File>> {
    let file = File::create(path)?;
    Ok(ArrowWriter::try_new(file, Arc::clone(schema), Some(snappy_props()))?)
}

struct RunFiles {
    stats: ArrowWriter<File>,
    lanes: ArrowWriter<File>,
    rows:  Vec<RunStatsRow>,
}

/// Writes campaign output to Parquet files.
///
/// `end_run()` / `finish()` **must** be called to write the Parquet file
/// footers; files written without them cannot be opened by Parquet readers.
pub struct ParquetWriter {
    dir:           PathBuf,
    run:           Option<RunFiles>,
    short_batches: Vec<ShortBatchRow>,
    stats_schema:  Arc<Schema>,
    lanes_schema:  Arc<Schema>,
    finished:      bool,
}

impl ParquetWriter {
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Ok(Self {
            dir:           dir.to_path_buf(),
            run:           None,
            short_batches: Vec::new(),
            stats_schema:  stats_schema(),
            lanes_schema:  lanes_schema(),
            finished:      false,
        })
    }

    fn stats_batch(&self, rows: &[RunStatsRow]) -> OutputResult<RecordBatch> {
        let mut tick        = UInt64Builder::new();
        let mut time        = StringBuilder::new();
        let mut live        = UInt64Builder::new();
        let mut mean_speed  = Float64Builder::new();
        let mut waiting     = UInt64Builder::new();
        let mut route_time  = Float64Builder::new();
        let mut throughput  = UInt64Builder::new();
        let mut max_density = Float64Builder::new();
        let mut max_lane    = StringBuilder::new();
        let mut max_lat     = Float64Builder::new();
        let mut max_lon     = Float64Builder::new();
        let mut max_wait    = Float64Builder::new();
        let mut total_dist  = Float64Builder::new();
        let mut avg_dist    = Float64Builder::new();
        let mut deviation   = Float64Builder::new();
        let mut congested   = UInt64Builder::new();

        for r in rows {
            tick.append_value(r.tick);
            time.append_value(&r.time);
            live.append_value(r.live_count);
            mean_speed.append_value(r.mean_speed);
            waiting.append_value(r.waiting_count);
            route_time.append_value(r.avg_route_time);
            throughput.append_value(r.throughput);
            max_density.append_value(r.max_density);
            max_lane.append_value(&r.max_density_lane);
            max_lat.append_value(r.max_density_lat);
            max_lon.append_value(r.max_density_lon);
            max_wait.append_value(r.max_wait_time);
            total_dist.append_value(r.total_distance);
            avg_dist.append_value(r.avg_distance);
            deviation.append_value(r.avg_route_deviation);
            congested.append_value(r.congested_lanes);
        }

        Ok(RecordBatch::try_new(
            Arc::clone(&self.stats_schema),
            vec![
                Arc::new(tick.finish()),
                Arc::new(time.finish()),
                Arc::new(live.finish()),
                Arc::new(mean_speed.finish()),
                Arc::new(waiting.finish()),
                Arc::new(route_time.finish()),
                Arc::new(throughput.finish()),
                Arc::new(max_density.finish()),
                Arc::new(max_lane.finish()),
                Arc::new(max_lat.finish()),
                Arc::new(max_lon.finish()),
                Arc::new(max_wait.finish()),
                Arc::new(total_dist.finish()),
                Arc::new(avg_dist.finish()),
                Arc::new(deviation.finish()),
                Arc::new(congested.finish()),
            ],
        )?)
    }

    fn write_short_batches(&mut self) -> OutputResult<()> {
        let schema = short_batch_schema();
        let mut writer = open(self.dir.join("short_batches.parquet"), &schema)?;

        let mut day_type   = StringBuilder::new();
        let mut run_number = UInt32Builder::new();
        let mut tick       = UInt64Builder::new();
        let mut time       = StringBuilder::new();
        let mut requested  = UInt64Builder::new();
        let mut skipped    = UInt64Builder::new();
        for r in self.short_batches.drain(..) {
            day_type.append_value(&r.day_type);
            run_number.append_value(r.run_number);
            tick.append_value(r.tick);
            time.append_value(&r.time);
            requested.append_value(r.requested);
            skipped.append_value(r.skipped);
        }

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(day_type.finish()),
                Arc::new(run_number.finish()),
                Arc::new(tick.finish()),
                Arc::new(time.finish()),
                Arc::new(requested.finish()),
                Arc::new(skipped.finish()),
            ],
        )?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }
}

impl OutputWriter for ParquetWriter {
    fn begin_run(&mut self, run: &RunLabel) -> OutputResult<()> {
        self.end_run()?;
        self.run = Some(RunFiles {
            stats: open(self.dir.join(format!("{run}_stats.parquet")), &self.stats_schema)?,
            lanes: open(self.dir.join(format!("{run}_lanes.parquet")), &self.lanes_schema)?,
            rows:  Vec::new(),
        });
        Ok(())
    }

    fn write_stats(&mut self, row: &RunStatsRow) -> OutputResult<()> {
        let files = self.run.as_mut().ok_or(OutputError::NoOpenRun)?;
        files.rows.push(row.clone());
        Ok(())
    }

    fn write_lane_densities(&mut self, rows: &[LaneDensityRow]) -> OutputResult<()> {
        let schema = Arc::clone(&self.lanes_schema);
        let files = self.run.as_mut().ok_or(OutputError::NoOpenRun)?;
        if rows.is_empty() {
            return Ok(());
        }

        let mut tick    = UInt64Builder::new();
        let mut time    = StringBuilder::new();
        let mut lane    = StringBuilder::new();
        let mut count   = UInt32Builder::new();
        let mut length  = Float64Builder::new();
        let mut density = Float64Builder::new();
        let mut lat     = Float64Builder::new();
        let mut lon     = Float64Builder::new();
        for r in rows {
            tick.append_value(r.tick);
            time.append_value(&r.time);
            lane.append_value(&r.lane);
            count.append_value(r.pedestrian_count);
            length.append_value(r.length);
            density.append_value(r.density);
            lat.append_option(r.lat);
            lon.append_option(r.lon);
        }

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(tick.finish()),
                Arc::new(time.finish()),
                Arc::new(lane.finish()),
                Arc::new(count.finish()),
                Arc::new(length.finish()),
                Arc::new(density.finish()),
                Arc::new(lat.finish()),
                Arc::new(lon.finish()),
            ],
        )?;
        files.lanes.write(&batch)?;
        Ok(())
    }

    fn write_short_batch(&mut self, row: &ShortBatchRow) -> OutputResult<()> {
        self.short_batches.push(row.clone());
        Ok(())
    }

    fn end_run(&mut self) -> OutputResult<()> {
        let Some(mut files) = self.run.take() else {
            return Ok(());
        };
        if !files.rows.is_empty() {
            let batch = self.stats_batch(&files.rows)?;
            files.stats.write(&batch)?;
        }
        files.stats.close()?;
        files.lanes.close()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.end_run()?;
        self.write_short_batches()
    }
}
