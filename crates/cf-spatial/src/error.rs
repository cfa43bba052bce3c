//! Routing-oracle error type.

use thiserror::Error;

use cf_core::{EdgeId, GeoPoint};

/// Errors produced by a [`RouteOracle`](crate::RouteOracle) or the client
/// in front of it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    /// The oracle could not be reached or answered with garbage.  The client
    /// recovers from this with retries and, for spawning, a direct route.
    #[error("routing oracle unavailable: {0}")]
    Unavailable(String),

    #[error("no walkway near {0}")]
    NotLocatable(GeoPoint),

    #[error("no route from edge {from} to edge {to}")]
    NoRoute { from: EdgeId, to: EdgeId },

    #[error("invalid mode weights: {0}")]
    InvalidWeights(String),
}

pub type OracleResult<T> = Result<T, OracleError>;
