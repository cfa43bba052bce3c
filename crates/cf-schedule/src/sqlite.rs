//! SQLite schedule source (feature `sqlite`).
//!
//! Expects two tables:
//!
//! ```sql
//! CREATE TABLE building (
//!     building_id INTEGER PRIMARY KEY,
//!     name        TEXT    NOT NULL,
//!     latitude    REAL    NOT NULL,
//!     longitude   REAL    NOT NULL
//! );
//! CREATE TABLE occupancy_schedule (
//!     building_id     INTEGER NOT NULL REFERENCES building(building_id),
//!     start_time      TEXT    NOT NULL,   -- HH:MM:SS
//!     end_time        TEXT    NOT NULL,
//!     occupancy_value INTEGER NOT NULL,
//!     day             TEXT    NOT NULL    -- DayType label
//! );
//! ```

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use cf_core::{BuildingId, GeoPoint, TimeOfDay};

use crate::source::events_from_rows;
use crate::{Building, DayType, OccupancyRow, ScheduleError, ScheduleResult, ScheduleSource, SpawnEvent};

/// A [`ScheduleSource`] reading from an SQLite database.
pub struct SqliteScheduleSource {
    conn: Connection,
}

impl SqliteScheduleSource {
    /// Open an existing database read-only.  A missing file is
    /// `DataUnavailable`, not an empty schedule.
    pub fn open(path: &Path) -> ScheduleResult<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| ScheduleError::DataUnavailable(format!("{}: {e}", path.display())))?;
        Ok(Self { conn })
    }

    /// Wrap an already-open connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn rows_for(&self, day_type: DayType) -> ScheduleResult<Vec<OccupancyRow>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT b.building_id, b.name, b.latitude, b.longitude, \
                    o.start_time, o.end_time, o.occupancy_value \
             FROM building AS b \
             INNER JOIN occupancy_schedule AS o ON b.building_id = o.building_id \
             WHERE o.day = ?1 \
             ORDER BY o.start_time",
        )?;

        let raw = stmt.query_map([day_type.label()], |r| {
            Ok((
                r.get::<_, u32>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, f64>(2)?,
                r.get::<_, f64>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
                r.get::<_, i64>(6)?,
            ))
        })?;

        let mut rows = Vec::new();
        for item in raw {
            let (id, name, lat, lon, start, end, occupancy) = item?;
            rows.push(OccupancyRow {
                building_id: BuildingId(id),
                name,
                location:    GeoPoint::new(lat, lon),
                start_time:  parse_time(&start)?,
                end_time:    parse_time(&end)?,
                occupancy,
                day_type,
            });
        }
        Ok(rows)
    }
}

impl ScheduleSource for SqliteScheduleSource {
    fn events_for(&self, day_type: DayType) -> ScheduleResult<Vec<SpawnEvent>> {
        let rows = self.rows_for(day_type)?;
        Ok(events_from_rows(&rows, day_type))
    }

    fn buildings(&self) -> ScheduleResult<Vec<Building>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT building_id, name, latitude, longitude FROM building ORDER BY building_id",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok(Building {
                id:       BuildingId(r.get(0)?),
                name:     r.get(1)?,
                location: GeoPoint::new(r.get(2)?, r.get(3)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn parse_time(s: &str) -> ScheduleResult<TimeOfDay> {
    s.parse::<TimeOfDay>()
        .map_err(|_| ScheduleError::Parse(format!("invalid time {s:?} in occupancy_schedule")))
}
