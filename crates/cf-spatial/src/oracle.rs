//! The routing-oracle boundary.
//!
//! The simulation never searches for paths itself.  It asks an oracle two
//! questions: "which edge is this coordinate on?" and "how do I walk from
//! this edge to that one?".  Anything that can answer them (a SUMO/TraCI
//! bridge, an HTTP router, the in-process [`DijkstraOracle`]) implements
//! [`RouteOracle`].
//!
//! [`DijkstraOracle`]: crate::DijkstraOracle

use std::fmt;

use cf_core::{EdgeId, GeoPoint};

use crate::OracleResult;

/// Vehicle class sent with every route request.
pub const PEDESTRIAN: &str = "pedestrian";

// ── RoutingMode ───────────────────────────────────────────────────────────────

/// Cost model the oracle should optimise.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RoutingMode {
    /// Minimum walking distance.
    Shortest,
    /// Prefer walkways with spare capacity.
    CongestionAware,
    /// Minimum historically observed travel time.
    Historical,
}

impl RoutingMode {
    pub const ALL: [RoutingMode; 3] =
        [RoutingMode::Shortest, RoutingMode::CongestionAware, RoutingMode::Historical];

    pub fn as_str(self) -> &'static str {
        match self {
            RoutingMode::Shortest        => "shortest",
            RoutingMode::CongestionAware => "congestion_aware",
            RoutingMode::Historical      => "historical",
        }
    }
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Request / response types ──────────────────────────────────────────────────

/// Where a coordinate lands on the network.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgePosition {
    pub edge:       EdgeId,
    /// Metres from the start of `edge`.
    pub offset:     f64,
    pub lane_index: u16,
}

/// `{start_edge, end_edge, vehicle_class, routing_mode}`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RouteRequest {
    pub start:         EdgeId,
    pub end:           EdgeId,
    pub vehicle_class: &'static str,
    pub mode:          RoutingMode,
}

impl RouteRequest {
    pub fn pedestrian(start: EdgeId, end: EdgeId, mode: RoutingMode) -> Self {
        Self { start, end, vehicle_class: PEDESTRIAN, mode }
    }
}

// ── RouteOracle trait ─────────────────────────────────────────────────────────

/// Pluggable routing oracle.
///
/// Implementations may return an empty edge list instead of an error; the
/// client treats both as a failed attempt.
pub trait RouteOracle {
    /// Snap a coordinate onto the walkway network.
    fn locate(&self, point: GeoPoint) -> OracleResult<EdgePosition>;

    /// Edge sequence from `req.start` to `req.end`, both inclusive.
    fn route(&self, req: &RouteRequest) -> OracleResult<Vec<EdgeId>>;
}

impl<O: RouteOracle + ?Sized> RouteOracle for &O {
    fn locate(&self, point: GeoPoint) -> OracleResult<EdgePosition> {
        (**self).locate(point)
    }

    fn route(&self, req: &RouteRequest) -> OracleResult<Vec<EdgeId>> {
        (**self).route(req)
    }
}

impl<O: RouteOracle + ?Sized> RouteOracle for Box<O> {
    fn locate(&self, point: GeoPoint) -> OracleResult<EdgePosition> {
        (**self).locate(point)
    }

    fn route(&self, req: &RouteRequest) -> OracleResult<Vec<EdgeId>> {
        (**self).route(req)
    }
}
