//! CSV schedule loader.
//!
//! # CSV format
//!
//! A data directory holds two files.  `occupancy.csv` has one row per
//! occupancy slot:
//!
//! ```csv
//! building_id,name,lat,lon,start_time,end_time,occupancy_value,day_type
//! 1,Atrium,33.938286,-84.518969,07:00:00,08:00:00,5,MWF
//! 2,Library,33.940275,-84.520132,09:30:00,10:45:00,40,TTh
//! ```
//!
//! `buildings.csv` lists every building a pedestrian may walk to:
//!
//! ```csv
//! building_id,name,lat,lon
//! 1,Atrium,33.938286,-84.518969
//! ```
//!
//! Times are `HH:MM:SS` (or `HH:MM`); `day_type` is a [`DayType`] label.
//!
//! Files are re-read on every call, so a campaign that switches day type
//! always sees the current contents of the directory.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use cf_core::{BuildingId, GeoPoint, TimeOfDay};

use crate::source::events_from_rows;
use crate::{Building, DayType, OccupancyRow, ScheduleError, ScheduleResult, ScheduleSource, SpawnEvent};

pub const OCCUPANCY_FILE: &str = "occupancy.csv";
pub const BUILDINGS_FILE: &str = "buildings.csv";

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OccupancyRecord {
    building_id:     u32,
    name:            String,
    lat:             f64,
    lon:             f64,
    start_time:      String,
    end_time:        String,
    occupancy_value: i64,
    day_type:        String,
}

#[derive(Deserialize)]
struct BuildingRecord {
    building_id: u32,
    name:        String,
    lat:         f64,
    lon:         f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse occupancy rows from any `Read` source.
///
/// Useful for testing (pass a `std::io::Cursor`) or embedded data.
pub fn load_occupancy_reader<R: Read>(reader: R) -> ScheduleResult<Vec<OccupancyRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for (i, result) in csv_reader.deserialize::<OccupancyRecord>().enumerate() {
        let r = result.map_err(|e| ScheduleError::Parse(e.to_string()))?;
        let line = i + 2; // header is line 1
        rows.push(OccupancyRow {
            building_id: BuildingId(r.building_id),
            name:        r.name,
            location:    GeoPoint::new(r.lat, r.lon),
            start_time:  parse_time(&r.start_time, line)?,
            end_time:    parse_time(&r.end_time, line)?,
            occupancy:   r.occupancy_value,
            day_type:    r.day_type.parse()?,
        });
    }
    Ok(rows)
}

/// Parse building rows from any `Read` source.
pub fn load_buildings_reader<R: Read>(reader: R) -> ScheduleResult<Vec<Building>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize::<BuildingRecord>()
        .map(|result| {
            let r = result.map_err(|e| ScheduleError::Parse(e.to_string()))?;
            Ok(Building {
                id:       BuildingId(r.building_id),
                name:     r.name,
                location: GeoPoint::new(r.lat, r.lon),
            })
        })
        .collect()
}

// ── CsvScheduleSource ─────────────────────────────────────────────────────────

/// A [`ScheduleSource`] backed by `occupancy.csv` + `buildings.csv`.
#[derive(Clone, Debug)]
pub struct CsvScheduleSource {
    occupancy_path: PathBuf,
    buildings_path: PathBuf,
}

impl CsvScheduleSource {
    /// Use the standard file names inside `dir`.
    pub fn new(dir: &Path) -> Self {
        Self::with_paths(dir.join(OCCUPANCY_FILE), dir.join(BUILDINGS_FILE))
    }

    pub fn with_paths(occupancy_path: PathBuf, buildings_path: PathBuf) -> Self {
        Self { occupancy_path, buildings_path }
    }

    fn open(path: &Path) -> ScheduleResult<File> {
        File::open(path)
            .map_err(|e| ScheduleError::DataUnavailable(format!("{}: {e}", path.display())))
    }
}

impl ScheduleSource for CsvScheduleSource {
    fn events_for(&self, day_type: DayType) -> ScheduleResult<Vec<SpawnEvent>> {
        let rows = load_occupancy_reader(Self::open(&self.occupancy_path)?)?;
        let events = events_from_rows(&rows, day_type);
        tracing::debug!(
            path = %self.occupancy_path.display(),
            %day_type,
            rows = rows.len(),
            events = events.len(),
            "loaded occupancy schedule"
        );
        Ok(events)
    }

    fn buildings(&self) -> ScheduleResult<Vec<Building>> {
        load_buildings_reader(Self::open(&self.buildings_path)?)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_time(s: &str, line: usize) -> ScheduleResult<TimeOfDay> {
    s.parse::<TimeOfDay>()
        .map_err(|_| ScheduleError::Parse(format!("line {line}: invalid time {s:?}, expected HH:MM:SS")))
}
