//! `cf-output` — campaign output writers for campus-flow.
//!
//! Three backends are provided behind Cargo features:
//!
//! | Feature   | Backend | Files created                                                       |
//! |-----------|---------|---------------------------------------------------------------------|
//! | *(none)*  | CSV     | `<run>_stats.csv`, `<run>_lanes.csv` per run, `short_batches.csv`   |
//! | `sqlite`  | SQLite  | `output.db` (`run_stats`, `lane_densities`, `short_batches`)        |
//! | `parquet` | Parquet | `<run>_stats.parquet`, `<run>_lanes.parquet`, `short_batches.parquet` |
//!
//! `<run>` is the run label, e.g. `MWF_run07`.
//!
//! All backends implement [`OutputWriter`] and are driven by
//! [`RunOutputObserver`], which implements `cf_sim::RunObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cf_output::{CsvWriter, RunOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = RunOutputObserver::new(writer, &config);
//! let result = runner.run(&mut obs);
//! obs.finish()?;
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::RunOutputObserver;
pub use row::{LaneDensityRow, RunStatsRow, ShortBatchRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
