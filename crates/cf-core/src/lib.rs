//! `cf-core` — foundational types for the `campus-flow` pedestrian simulator.
//!
//! This crate is a dependency of every other `cf-*` crate.  It intentionally
//! has no `cf-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `EntityId`, `BuildingId`, `NodeId`, `EdgeId`, `LaneId`|
//! | [`geo`]         | `GeoPoint`, `Position`, haversine / planar distance   |
//! | [`time`]        | `Tick`, `TimeOfDay`, `SimClock`, `RunConfig`          |
//! | [`rng`]         | `SimRng` (per-run, forkable)                          |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by `cf-sim` for campaign configuration files.     |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::{GeoPoint, Position};
pub use ids::{BuildingId, EdgeId, EntityId, LaneId, NodeId};
pub use rng::SimRng;
pub use time::{RunConfig, SECS_PER_DAY, SimClock, Tick, TimeOfDay};
