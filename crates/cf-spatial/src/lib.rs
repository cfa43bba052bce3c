//! `cf-spatial` — the routing-oracle boundary and a reference walkway graph.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`oracle`]    | `RouteOracle` trait, `RoutingMode`, `EdgePosition`, `RouteRequest` |
//! | [`modes`]     | `ModeSelector` trait, `WeightedModes`, `ScriptedModes`    |
//! | [`client`]    | `RouteOracleClient` (LRU snapping cache, retries, fallback) |
//! | [`network`]   | `WalkNetwork` (CSR + R-tree), `WalkNetworkBuilder`        |
//! | [`dijkstra`]  | `DijkstraOracle`, an in-process `RouteOracle`             |
//! | [`error`]     | `OracleError`, `OracleResult<T>`                          |
//!
//! The engine in `cf-sim` only sees [`RouteOracleClient`] wrapping some
//! [`RouteOracle`].  `WalkNetwork` and `DijkstraOracle` exist so a campaign
//! can run without an external routing service.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on config types.           |

pub mod client;
pub mod dijkstra;
pub mod error;
pub mod modes;
pub mod network;
pub mod oracle;

#[cfg(test)]
mod tests;

pub use client::{ClientConfig, ClientStats, RouteAnswer, RouteOracleClient};
pub use dijkstra::DijkstraOracle;
pub use error::{OracleError, OracleResult};
pub use modes::{ModeSelector, ModeWeights, ScriptedModes, WeightedModes};
pub use network::{WalkNetwork, WalkNetworkBuilder};
pub use oracle::{EdgePosition, PEDESTRIAN, RouteOracle, RouteRequest, RoutingMode};
