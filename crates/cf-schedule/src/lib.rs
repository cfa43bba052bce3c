//! `cf-schedule` — occupancy schedules and spawn events.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                |
//! |-----------------|---------------------------------------------------------|
//! | [`day_type`]    | `DayType` (Base, LTP, MWF, TTh, SSu and peak variants)  |
//! | [`event`]       | `Building`, `OccupancyRow`, `SpawnEvent`, `SpawnKey`    |
//! | [`source`]      | `ScheduleSource` trait, `MemoryScheduleSource`          |
//! | [`loader`]      | `CsvScheduleSource`, CSV readers                        |
//! | `sqlite`        | `SqliteScheduleSource` (feature `sqlite`)               |
//! | [`spawn_queue`] | `SpawnQueue` (`BTreeMap<TimeOfDay, Vec<SpawnEvent>>`)   |
//! | [`error`]       | `ScheduleError`, `ScheduleResult<T>`                    |
//!
//! # Event model (summary)
//!
//! Each occupancy row says how many people are in a building between
//! `start_time` and `end_time`.  When the slot ends they walk somewhere
//! else, so a row becomes one `SpawnEvent` at `end_time` carrying the
//! occupancy as its pedestrian count.  The run loop asks the `SpawnQueue`
//! for the events of the current time of day and skips keys it has already
//! consumed.

pub mod day_type;
pub mod error;
pub mod event;
pub mod loader;
pub mod source;
pub mod spawn_queue;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use day_type::DayType;
pub use error::{ScheduleError, ScheduleResult};
pub use event::{Building, OccupancyRow, SpawnEvent, SpawnKey};
pub use loader::{CsvScheduleSource, load_buildings_reader, load_occupancy_reader};
pub use source::{MemoryScheduleSource, ScheduleSource, events_from_rows};
pub use spawn_queue::SpawnQueue;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteScheduleSource;
