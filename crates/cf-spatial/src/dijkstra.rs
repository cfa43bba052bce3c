//! In-process routing oracle: Dijkstra over a [`WalkNetwork`].
//!
//! # Cost units
//!
//! Costs are `u32` per edge:
//!
//! | Mode              | Edge cost                               |
//! |-------------------|-----------------------------------------|
//! | `Shortest`        | length in millimetres                   |
//! | `CongestionAware` | length in millimetres / lane count      |
//! | `Historical`      | `edge_travel_ms`                        |
//!
//! Dividing by lanes makes wide walkways cheaper, which is what a crowd
//! does when it has the choice.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use cf_core::{EdgeId, GeoPoint, NodeId};

use crate::{EdgePosition, OracleError, OracleResult, RouteOracle, RouteRequest, RoutingMode, WalkNetwork};

/// Dijkstra-backed [`RouteOracle`].  Shares the network with the stepper.
pub struct DijkstraOracle {
    network: Arc<WalkNetwork>,
}

impl DijkstraOracle {
    pub fn new(network: Arc<WalkNetwork>) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &WalkNetwork {
        &self.network
    }
}

impl RouteOracle for DijkstraOracle {
    /// Snap to the nearest node; return its first outgoing edge at offset 0,
    /// or, for a dead end, its first incoming edge at the far end.
    fn locate(&self, point: GeoPoint) -> OracleResult<EdgePosition> {
        let net = &*self.network;
        let node = net.snap_to_node(point).ok_or(OracleError::NotLocatable(point))?;

        if let Some(edge) = net.out_edges(node).next() {
            return Ok(EdgePosition { edge, offset: 0.0, lane_index: 0 });
        }
        match net.incoming(node).first() {
            Some(&edge) => Ok(EdgePosition {
                edge,
                offset:     net.edge_length_m[edge.index()] as f64,
                lane_index: 0,
            }),
            None => Err(OracleError::NotLocatable(point)),
        }
    }

    fn route(&self, req: &RouteRequest) -> OracleResult<Vec<EdgeId>> {
        let net = &*self.network;
        for edge in [req.start, req.end] {
            if !net.contains_edge(edge) {
                return Err(OracleError::Unavailable(format!("unknown edge {edge}")));
            }
        }
        if req.start == req.end {
            return Ok(vec![req.start]);
        }

        let from = net.edge_to[req.start.index()];
        let to   = net.edge_from[req.end.index()];
        let middle = shortest_path(net, from, to, req.mode)
            .ok_or(OracleError::NoRoute { from: req.start, to: req.end })?;

        let mut edges = Vec::with_capacity(middle.len() + 2);
        edges.push(req.start);
        edges.extend(middle);
        edges.push(req.end);
        Ok(edges)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

#[inline]
fn edge_cost(net: &WalkNetwork, edge: EdgeId, mode: RoutingMode) -> u32 {
    let e = edge.index();
    let length_mm = (net.edge_length_m[e] * 1000.0) as u32;
    match mode {
        RoutingMode::Shortest        => length_mm,
        RoutingMode::CongestionAware => length_mm / net.edge_lanes[e].max(1) as u32,
        RoutingMode::Historical      => net.edge_travel_ms[e],
    }
}

/// Edges from `from` to `to`, empty when they are the same node.
fn shortest_path(net: &WalkNetwork, from: NodeId, to: NodeId, mode: RoutingMode) -> Option<Vec<EdgeId>> {
    if from == to {
        return Some(Vec::new());
    }

    let n = net.node_count();
    let mut dist      = vec![u32::MAX; n];
    let mut prev_edge = vec![EdgeId::INVALID; n];
    dist[from.index()] = 0;

    // Secondary key NodeId makes tie-breaking deterministic.
    let mut heap: BinaryHeap<Reverse<(u32, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == to {
            return Some(reconstruct(net, &prev_edge, to));
        }
        if cost > dist[node.index()] {
            continue;
        }
        for edge in net.out_edges(node) {
            let next = net.edge_to[edge.index()];
            let new_cost = cost.saturating_add(edge_cost(net, edge, mode));
            if new_cost < dist[next.index()] {
                dist[next.index()] = new_cost;
                prev_edge[next.index()] = edge;
                heap.push(Reverse((new_cost, next)));
            }
        }
    }
    None
}

fn reconstruct(net: &WalkNetwork, prev_edge: &[EdgeId], to: NodeId) -> Vec<EdgeId> {
    let mut edges = Vec::new();
    let mut cur = to;
    while let Some(&e) = prev_edge.get(cur.index()).filter(|e| e.is_valid()) {
        edges.push(e);
        cur = net.edge_from[e.index()];
    }
    edges.reverse();
    edges
}
