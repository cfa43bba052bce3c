//! `RouteOracleClient` — retries, mode choice and snapping cache in front of
//! a [`RouteOracle`].
//!
//! `locate` answers are cached in a bounded LRU keyed by the rounded
//! coordinate: buildings never move, and every pedestrian leaving a building
//! asks the same question.  `route` answers are never cached because the
//! congestion-aware mode depends on live network state.
//!
//! A route attempt fails on an oracle error **or** an empty edge list.  Each
//! attempt draws a fresh mode from the [`ModeSelector`].

use std::num::NonZeroUsize;

use lru::LruCache;

use cf_core::{EdgeId, GeoPoint, SimRng};

use crate::{
    EdgePosition, ModeSelector, OracleResult, RouteOracle, RouteRequest, RoutingMode,
};

/// Client tuning knobs.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    /// Maximum cached `locate` answers.  Default: 4 096.
    pub locate_cache_capacity: usize,
    /// Decimal places kept in the cache key.  Default: 6 (~0.1 m).
    pub locate_precision:      u32,
    /// Route attempts before giving up.  Default: 3.
    pub max_attempts:          u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            locate_cache_capacity: 4_096,
            locate_precision:      6,
            max_attempts:          3,
        }
    }
}

/// Call counters, reported at the end of every run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientStats {
    pub locate_hits:    u64,
    pub locate_misses:  u64,
    pub route_requests: u64,
    /// Failed attempts (errors and empty answers).
    pub route_failures: u64,
    /// Requests that exhausted every attempt.
    pub exhausted:      u64,
}

/// A route the client settled on.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteAnswer {
    pub edges: Vec<EdgeId>,
    /// `None` for the degenerate direct route.
    pub mode:  Option<RoutingMode>,
}

impl RouteAnswer {
    pub fn is_degenerate(&self) -> bool {
        self.mode.is_none()
    }
}

pub struct RouteOracleClient<O> {
    oracle:       O,
    selector:     Box<dyn ModeSelector>,
    cache:        LruCache<(i64, i64), EdgePosition>,
    precision:    u32,
    max_attempts: u32,
    stats:        ClientStats,
}

impl<O: RouteOracle> RouteOracleClient<O> {
    pub fn new(oracle: O, selector: Box<dyn ModeSelector>, config: ClientConfig) -> Self {
        let capacity = NonZeroUsize::new(config.locate_cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            oracle,
            selector,
            cache: LruCache::new(capacity),
            precision: config.locate_precision,
            max_attempts: config.max_attempts.max(1),
            stats: ClientStats::default(),
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn stats(&self) -> ClientStats {
        self.stats
    }

    /// Zero the counters.  The snapping cache is kept: coordinates do not
    /// change between runs.
    pub fn reset_stats(&mut self) {
        self.stats = ClientStats::default();
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cached_locations(&self) -> usize {
        self.cache.len()
    }

    // ── locate ────────────────────────────────────────────────────────────

    /// Snap `point` onto the network.  Errors are not cached.
    pub fn locate(&mut self, point: GeoPoint) -> OracleResult<EdgePosition> {
        let key = point.rounded_key(self.precision);
        if let Some(hit) = self.cache.get(&key) {
            self.stats.locate_hits += 1;
            return Ok(*hit);
        }
        self.stats.locate_misses += 1;
        let pos = self.oracle.locate(point)?;
        self.cache.put(key, pos);
        Ok(pos)
    }

    // ── route ─────────────────────────────────────────────────────────────

    /// Route for a new pedestrian.  Never fails: when every attempt fails the
    /// answer is the direct route `[start, end]` (`[start]` when equal).
    pub fn route_or_direct(&mut self, start: EdgeId, end: EdgeId, rng: &mut SimRng) -> RouteAnswer {
        match self.try_route(start, end, rng) {
            Some(answer) => answer,
            None => {
                tracing::warn!(%start, %end, "oracle exhausted, using direct route");
                let edges = if start == end { vec![start] } else { vec![start, end] };
                RouteAnswer { edges, mode: None }
            }
        }
    }

    /// Route for rerouting.  `None` when every attempt fails, so the caller
    /// can keep the route it already has.
    pub fn try_route(&mut self, start: EdgeId, end: EdgeId, rng: &mut SimRng) -> Option<RouteAnswer> {
        self.stats.route_requests += 1;
        for attempt in 1..=self.max_attempts {
            let mode = self.selector.next_mode(rng);
            if let Some(edges) = self.attempt(start, end, mode, attempt) {
                return Some(RouteAnswer { edges, mode: Some(mode) });
            }
        }
        self.stats.exhausted += 1;
        None
    }

    /// One attempt with a caller-chosen mode.  Used to gather alternative
    /// candidates when rerouting.
    pub fn route_with_mode(&mut self, start: EdgeId, end: EdgeId, mode: RoutingMode) -> Option<Vec<EdgeId>> {
        self.stats.route_requests += 1;
        self.attempt(start, end, mode, 1)
    }

    fn attempt(&mut self, start: EdgeId, end: EdgeId, mode: RoutingMode, attempt: u32) -> Option<Vec<EdgeId>> {
        let req = RouteRequest::pedestrian(start, end, mode);
        match self.oracle.route(&req) {
            Ok(edges) if !edges.is_empty() => Some(edges),
            Ok(_) => {
                self.stats.route_failures += 1;
                tracing::debug!(%start, %end, %mode, attempt, "oracle returned an empty route");
                None
            }
            Err(e) => {
                self.stats.route_failures += 1;
                tracing::debug!(%start, %end, %mode, attempt, error = %e, "route attempt failed");
                None
            }
        }
    }
}
