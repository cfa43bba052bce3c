//! Integration tests for cf-output.

#[cfg(test)]
mod fixtures {
    use cf_core::{EdgeId, GeoPoint, LaneId, Tick, TimeOfDay};
    use cf_schedule::DayType;
    use cf_sim::{LaneDensitySample, RunLabel, RunStatsSnapshot};

    use crate::{LaneDensityRow, RunStatsRow, ShortBatchRow};

    pub fn label(run_number: u32) -> RunLabel {
        RunLabel { day_type: DayType::MwfPeak, run_number }
    }

    pub fn snapshot(tick: u64) -> RunStatsSnapshot {
        RunStatsSnapshot {
            tick:                Tick(tick),
            time:                TimeOfDay::from_secs(tick as u32),
            live_count:          12,
            mean_speed:          1.25,
            waiting_count:       2,
            avg_route_time:      300.0,
            throughput:          3,
            max_density:         3.5,
            max_density_lane:    Some(LaneId::new(EdgeId(17), 1)),
            max_density_lat:     33.94,
            max_density_lon:     -84.52,
            max_wait_time:       8.0,
            total_distance:      1_500.0,
            avg_distance:        125.0,
            avg_route_deviation: 1.1,
            congested_lanes:     4,
        }
    }

    pub fn stats_row(tick: u64) -> RunStatsRow {
        RunStatsRow::from(&snapshot(tick))
    }

    pub fn lane_sample(edge: u32, tick: u64, located: bool) -> LaneDensitySample {
        LaneDensitySample {
            lane:             LaneId::primary(EdgeId(edge)),
            tick:             Tick(tick),
            pedestrian_count: 6,
            length:           2.0,
            density:          3.0,
            location:         located.then(|| GeoPoint::new(33.94, -84.52)),
        }
    }

    pub fn lane_row(edge: u32, located: bool) -> LaneDensityRow {
        LaneDensityRow::new(&lane_sample(edge, 60, located), TimeOfDay::from_secs(60))
    }

    pub fn short_row(tick: u64) -> ShortBatchRow {
        ShortBatchRow {
            day_type:   "MWF_Peak".into(),
            run_number: 1,
            tick,
            time:       TimeOfDay::from_secs(tick as u32).to_string(),
            requested:  10,
            skipped:    4,
        }
    }
}

// ── Rows ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod rows {
    use cf_core::Tick;
    use cf_sim::ShortBatch;

    use super::fixtures::*;
    use crate::{RunStatsRow, ShortBatchRow};

    #[test]
    fn stats_row_formats_time_and_lane() {
        let row = stats_row(28_860);
        assert_eq!(row.time, "08:01:00");
        assert_eq!(row.max_density_lane, "17_1");
        assert_eq!(row.live_count, 12);
    }

    #[test]
    fn missing_max_lane_is_empty() {
        let mut s = snapshot(0);
        s.max_density_lane = None;
        assert_eq!(RunStatsRow::from(&s).max_density_lane, "");
    }

    #[test]
    fn lane_row_keeps_optional_location() {
        assert_eq!(lane_row(3, true).lat, Some(33.94));
        assert_eq!(lane_row(3, false).lon, None);
        assert_eq!(lane_row(3, false).lane, "3_0");
    }

    #[test]
    fn short_batch_row_carries_run_identity() {
        let batch = ShortBatch { tick: Tick(120), time: "00:02:00".parse().unwrap(), requested: 5, skipped: 2 };
        let row = ShortBatchRow::new(&label(7), &batch);
        assert_eq!(row.day_type, "MWF_Peak");
        assert_eq!(row.run_number, 7);
        assert_eq!(row.time, "00:02:00");
        assert_eq!((row.requested, row.skipped), (5, 2));
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use super::fixtures::*;
    use crate::csv::{CsvWriter, LANES_HEADER, SHORT_BATCH_HEADER, STATS_HEADER};
    use crate::writer::OutputWriter;
    use crate::OutputError;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn headers(path: std::path::PathBuf) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    fn records(path: std::path::PathBuf) -> Vec<csv::StringRecord> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.records().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn run_files_are_named_after_the_run() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("short_batches.csv").exists());

        w.begin_run(&label(3)).unwrap();
        assert!(dir.path().join("MWF_Peak_run03_stats.csv").exists());
        assert!(dir.path().join("MWF_Peak_run03_lanes.csv").exists());
        w.finish().unwrap();

        assert_eq!(headers(dir.path().join("MWF_Peak_run03_stats.csv")), STATS_HEADER);
        assert_eq!(headers(dir.path().join("MWF_Peak_run03_lanes.csv")), LANES_HEADER);
        assert_eq!(headers(dir.path().join("short_batches.csv")), SHORT_BATCH_HEADER);
    }

    #[test]
    fn stats_rows_land_in_their_run() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.begin_run(&label(1)).unwrap();
        w.write_stats(&stats_row(0)).unwrap();
        w.write_stats(&stats_row(60)).unwrap();
        w.begin_run(&label(2)).unwrap();
        w.write_stats(&stats_row(0)).unwrap();
        w.finish().unwrap();

        let first = records(w.stats_path(&label(1)));
        assert_eq!(first.len(), 2);
        assert_eq!(&first[1][0], "60");
        assert_eq!(&first[1][1], "00:01:00");
        assert_eq!(&first[1][8], "17_1");
        assert_eq!(records(w.stats_path(&label(2))).len(), 1);
    }

    #[test]
    fn lane_rows_leave_unknown_location_blank() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.begin_run(&label(1)).unwrap();
        w.write_lane_densities(&[lane_row(4, true), lane_row(5, false)]).unwrap();
        w.end_run().unwrap();

        let rows = records(w.lanes_path(&label(1)));
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "4_0");
        assert_eq!(&rows[0][6], "33.94");
        assert_eq!(&rows[1][6], "");
        assert_eq!(&rows[1][7], "");
    }

    #[test]
    fn short_batches_span_runs() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_short_batch(&short_row(120)).unwrap();
        w.begin_run(&label(1)).unwrap();
        w.write_short_batch(&short_row(180)).unwrap();
        w.finish().unwrap();

        let rows = records(dir.path().join("short_batches.csv"));
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][0], "MWF_Peak");
        assert_eq!(&rows[1][3], "00:03:00");
        assert_eq!(&rows[1][5], "4");
    }

    #[test]
    fn run_records_need_an_open_run() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        assert!(matches!(w.write_stats(&stats_row(0)), Err(OutputError::NoOpenRun)));
        w.begin_run(&label(1)).unwrap();
        w.end_run().unwrap();
        assert!(matches!(w.write_lane_densities(&[]), Err(OutputError::NoOpenRun)));
    }

    #[test]
    fn finish_is_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn missing_directory_fails() {
        let dir = tmp();
        let result = CsvWriter::new(&dir.path().join("does-not-exist"));
        assert!(result.is_err());
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use std::sync::Arc;

    use cf_core::{BuildingId, GeoPoint, TimeOfDay};
    use cf_mobility::{WalkConfig, WalkStepper};
    use cf_schedule::{Building, DayType, MemoryScheduleSource, OccupancyRow};
    use cf_sim::{CampaignBuilder, CampaignConfig, RunObserver};
    use cf_spatial::{DijkstraOracle, WalkNetworkBuilder};

    use super::fixtures::*;
    use crate::{CsvWriter, RunOutputObserver};

    fn records(path: std::path::PathBuf) -> usize {
        csv::Reader::from_path(path).unwrap().records().count()
    }

    #[test]
    fn lane_rows_get_the_time_of_day() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CampaignConfig::default();
        config.run.start_time_of_day = "07:00:00".parse().unwrap();
        let mut obs = RunOutputObserver::new(CsvWriter::new(dir.path()).unwrap(), &config);

        obs.on_run_start(&label(1));
        obs.on_lane_densities(&label(1), &[lane_sample(2, 120, false)]);
        obs.finish().unwrap();

        let w = obs.into_writer();
        let mut rdr = csv::Reader::from_path(w.lanes_path(&label(1))).unwrap();
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "07:02:00");
    }

    #[test]
    fn first_write_error_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut obs = RunOutputObserver::new(CsvWriter::new(dir.path()).unwrap(), &CampaignConfig::default());

        // No run open: both writes fail, only the first error is stored.
        obs.on_snapshot(&label(1), &snapshot(0));
        obs.on_snapshot(&label(1), &snapshot(60));
        assert!(obs.take_error().is_some());
        assert!(obs.take_error().is_none());
    }

    #[test]
    fn finish_reports_stored_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut obs = RunOutputObserver::new(CsvWriter::new(dir.path()).unwrap(), &CampaignConfig::default());
        obs.on_snapshot(&label(1), &snapshot(0));
        assert!(obs.finish().is_err());
    }

    #[test]
    fn campaign_writes_one_series_per_run() {
        let a = GeoPoint::new(33.9400, -84.5200);
        let b = GeoPoint::new(33.9409, -84.5200);
        let mut nb = WalkNetworkBuilder::new();
        let n0 = nb.add_node(a);
        let n1 = nb.add_node(b);
        nb.add_walkway(n0, n1, 100.0, 1);
        let net = Arc::new(nb.build());

        let row = OccupancyRow {
            building_id: BuildingId(1),
            name:        "Library".into(),
            location:    a,
            start_time:  TimeOfDay::MIDNIGHT,
            end_time:    "00:01:00".parse().unwrap(),
            occupancy:   4,
            day_type:    DayType::Base,
        };
        let buildings = vec![
            Building { id: BuildingId(1), name: "Library".into(), location: a },
            Building { id: BuildingId(2), name: "Student Center".into(), location: b },
        ];
        let config = CampaignConfig {
            runs_per_day_type: 2,
            day_types: vec![DayType::Base],
            ..CampaignConfig::default()
        };

        let dir = tempfile::tempdir().unwrap();
        let mut obs = RunOutputObserver::new(CsvWriter::new(dir.path()).unwrap(), &config);
        let mut runner = CampaignBuilder::new(
            config,
            MemoryScheduleSource::new(vec![row], buildings),
            DijkstraOracle::new(Arc::clone(&net)),
            WalkStepper::new(net, WalkConfig::default()),
        )
        .build()
        .unwrap();
        let report = runner.run(&mut obs).unwrap();
        obs.finish().unwrap();

        for summary in &report.runs {
            let stats = dir.path().join(format!("{}_stats.csv", summary.label));
            assert!(dir.path().join(format!("{}_lanes.csv", summary.label)).exists());
            assert_eq!(records(stats) as u64, summary.snapshots);
        }
        assert!(dir.path().join("Base_run02_stats.csv").exists());
        assert_eq!(records(dir.path().join("short_batches.csv")), 0);
    }
}

// ── SQLite tests ──────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use tempfile::TempDir;

    use super::fixtures::*;
    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;
    use crate::OutputError;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn open(dir: &TempDir) -> rusqlite::Connection {
        rusqlite::Connection::open(dir.path().join("output.db")).unwrap()
    }

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("output.db").exists());
    }

    #[test]
    fn stats_rows_tagged_with_run() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.begin_run(&label(2)).unwrap();
        w.write_stats(&stats_row(0)).unwrap();
        w.write_stats(&stats_row(60)).unwrap();
        w.end_run().unwrap();
        w.finish().unwrap();

        let (day_type, run, count): (String, i64, i64) = open(&dir)
            .query_row(
                "SELECT day_type, run_number, COUNT(*) FROM run_stats GROUP BY day_type, run_number",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!((day_type.as_str(), run, count), ("MWF_Peak", 2, 2));
    }

    #[test]
    fn lane_location_may_be_null() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.begin_run(&label(1)).unwrap();
        w.write_lane_densities(&[lane_row(1, true), lane_row(2, false)]).unwrap();
        w.finish().unwrap();

        let lat: Option<f64> = open(&dir)
            .query_row("SELECT lat FROM lane_densities WHERE lane = '2_0'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(lat, None);
        let n: i64 = open(&dir).query_row("SELECT COUNT(*) FROM lane_densities", [], |r| r.get(0)).unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn short_batches_need_no_run() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_short_batch(&short_row(120)).unwrap();
        w.finish().unwrap();

        let skipped: i64 = open(&dir).query_row("SELECT skipped FROM short_batches", [], |r| r.get(0)).unwrap();
        assert_eq!(skipped, 4);
    }

    #[test]
    fn stats_without_run_rejected() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        assert!(matches!(w.write_stats(&stats_row(0)), Err(OutputError::NoOpenRun)));
    }
}

// ── Parquet tests ─────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "parquet"))]
mod parquet_tests {
    use tempfile::TempDir;

    use arrow::datatypes::DataType;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    use super::fixtures::*;
    use crate::parquet::ParquetWriter;
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn row_count(path: std::path::PathBuf) -> usize {
        let file = std::fs::File::open(path).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file).unwrap().build().unwrap();
        reader.map(|b| b.unwrap().num_rows()).sum()
    }

    #[test]
    fn run_files_written_on_end_run() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.begin_run(&label(1)).unwrap();
        w.write_stats(&stats_row(0)).unwrap();
        w.write_stats(&stats_row(60)).unwrap();
        w.write_lane_densities(&[lane_row(1, true), lane_row(2, false)]).unwrap();
        w.end_run().unwrap();

        assert_eq!(row_count(dir.path().join("MWF_Peak_run01_stats.parquet")), 2);
        assert_eq!(row_count(dir.path().join("MWF_Peak_run01_lanes.parquet")), 2);
    }

    #[test]
    fn short_batches_written_on_finish() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.write_short_batch(&short_row(60)).unwrap();
        w.write_short_batch(&short_row(120)).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
        assert_eq!(row_count(dir.path().join("short_batches.parquet")), 2);
    }

    #[test]
    fn lane_location_columns_are_nullable() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.begin_run(&label(1)).unwrap();
        w.write_lane_densities(&[lane_row(1, false)]).unwrap();
        w.finish().unwrap();

        let file = std::fs::File::open(dir.path().join("MWF_Peak_run01_lanes.parquet")).unwrap();
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
        let lat = builder.schema().field_with_name("lat").unwrap().clone();
        assert!(lat.is_nullable());
        assert_eq!(*lat.data_type(), DataType::Float64);
    }

    #[test]
    fn unfinished_run_is_unreadable() {
        let dir = tmp();
        {
            let mut w = ParquetWriter::new(dir.path()).unwrap();
            w.begin_run(&label(1)).unwrap();
            w.write_stats(&stats_row(0)).unwrap();
            // Dropped without end_run(): no footer.
        }
        let file = std::fs::File::open(dir.path().join("MWF_Peak_run01_stats.parquet")).unwrap();
        assert!(ParquetRecordBatchReaderBuilder::try_new(file).is_err());
    }
}
