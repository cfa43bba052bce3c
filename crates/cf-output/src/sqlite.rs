//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! three tables: `run_stats`, `lane_densities` and `short_batches`.  Per-run
//! rows carry `(day_type, run_number)`.

use std::path::Path;

use rusqlite::{Connection, params};

use cf_sim::RunLabel;

use crate::writer::OutputWriter;
use crate::{LaneDensityRow, OutputError, OutputResult, RunStatsRow, ShortBatchRow};

/// Writes campaign output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    run:      Option<(String, u32)>,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS run_stats (
                 day_type            TEXT    NOT NULL,
                 run_number          INTEGER NOT NULL,
                 tick                INTEGER NOT NULL,
                 time                TEXT    NOT NULL,
                 live_count          INTEGER NOT NULL,
                 mean_speed          REAL    NOT NULL,
                 waiting_count       INTEGER NOT NULL,
                 avg_route_time      REAL    NOT NULL,
                 throughput          INTEGER NOT NULL,
                 max_density         REAL    NOT NULL,
                 max_density_lane    TEXT    NOT NULL,
                 max_density_lat     REAL    NOT NULL,
                 max_density_lon     REAL    NOT NULL,
                 max_wait_time       REAL    NOT NULL,
                 total_distance      REAL    NOT NULL,
                 avg_distance        REAL    NOT NULL,
                 avg_route_deviation REAL    NOT NULL,
                 congested_lanes     INTEGER NOT NULL,
                 PRIMARY KEY (day_type, run_number, tick)
             );
             CREATE TABLE IF NOT EXISTS lane_densities (
                 day_type         TEXT    NOT NULL,
                 run_number       INTEGER NOT NULL,
                 tick             INTEGER NOT NULL,
                 time             TEXT    NOT NULL,
                 lane             TEXT    NOT NULL,
                 pedestrian_count INTEGER NOT NULL,
                 length           REAL    NOT NULL,
                 density          REAL    NOT NULL,
                 lat              REAL,
                 lon              REAL
             );
             CREATE TABLE IF NOT EXISTS short_batches (
                 day_type   TEXT    NOT NULL,
                 run_number INTEGER NOT NULL,
                 tick       INTEGER NOT NULL,
                 time       TEXT    NOT NULL,
                 requested  INTEGER NOT NULL,
                 skipped    INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, run: None, finished: false })
    }

    fn current(&self) -> OutputResult<(&str, u32)> {
        self.run.as_ref().map(|(d, n)| (d.as_str(), *n)).ok_or(OutputError::NoOpenRun)
    }
}

impl OutputWriter for SqliteWriter {
    fn begin_run(&mut self, run: &RunLabel) -> OutputResult<()> {
        self.run = Some((run.day_type.to_string(), run.run_number));
        Ok(())
    }

    fn write_stats(&mut self, row: &RunStatsRow) -> OutputResult<()> {
        let (day_type, run_number) = self.current()?;
        self.conn.execute(
            "INSERT INTO run_stats VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                day_type,
                run_number,
                row.tick as i64,
                row.time,
                row.live_count as i64,
                row.mean_speed,
                row.waiting_count as i64,
                row.avg_route_time,
                row.throughput as i64,
                row.max_density,
                row.max_density_lane,
                row.max_density_lat,
                row.max_density_lon,
                row.max_wait_time,
                row.total_distance,
                row.avg_distance,
                row.avg_route_deviation,
                row.congested_lanes as i64,
            ],
        )?;
        Ok(())
    }

    fn write_lane_densities(&mut self, rows: &[LaneDensityRow]) -> OutputResult<()> {
        let (day_type, run_number) = self.current()?;
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO lane_densities \
                 (day_type, run_number, tick, time, lane, pedestrian_count, length, density, lat, lon) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for row in rows {
                stmt.execute(params![
                    day_type,
                    run_number,
                    row.tick as i64,
                    row.time,
                    row.lane,
                    row.pedestrian_count,
                    row.length,
                    row.density,
                    row.lat,
                    row.lon,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_short_batch(&mut self, row: &ShortBatchRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO short_batches (day_type, run_number, tick, time, requested, skipped) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.day_type,
                row.run_number,
                row.tick as i64,
                row.time,
                row.requested as i64,
                row.skipped as i64,
            ],
        )?;
        Ok(())
    }

    fn end_run(&mut self) -> OutputResult<()> {
        self.run = None;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.run = None;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
