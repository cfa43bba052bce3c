//! Walkway network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_from[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! Edge arrays are sorted by source node and indexed by `EdgeId`, so a
//! node's outgoing edges are a contiguous scan in Dijkstra's inner loop.
//! Incoming edges are kept as a second CSR (`node_in_start` / `in_edges`)
//! for snapping a point onto a dead-end node.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps `(lat, lon)` to the nearest `NodeId`.  Used
//! to snap building coordinates onto the network.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use cf_core::{EdgeId, GeoPoint, LaneId, NodeId, Position};

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2], // [lat, lon]
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lat/lon space.  Good enough for
    /// nearest-node queries on a campus.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── WalkNetwork ───────────────────────────────────────────────────────────────

/// Directed walkway graph in CSR format plus a spatial index.
///
/// All fields are `pub` for direct indexed access on hot paths.  Build with
/// [`WalkNetworkBuilder`].
pub struct WalkNetwork {
    // ── Node data ─────────────────────────────────────────────────────────
    pub node_pos: Vec<GeoPoint>,
    /// Planar position of each node relative to `origin`, in metres.
    pub node_xy:  Vec<Position>,
    pub origin:   GeoPoint,

    // ── CSR adjacency ─────────────────────────────────────────────────────
    pub node_out_start: Vec<u32>,
    pub node_in_start:  Vec<u32>,
    /// Edge ids grouped by destination node (see `node_in_start`).
    pub in_edges:       Vec<EdgeId>,

    // ── Edge data (indexed by EdgeId) ─────────────────────────────────────
    pub edge_from:      Vec<NodeId>,
    pub edge_to:        Vec<NodeId>,
    pub edge_length_m:  Vec<f32>,
    /// Historically observed walking time in milliseconds.
    pub edge_travel_ms: Vec<u32>,
    /// Parallel lanes on each edge (at least 1).
    pub edge_lanes:     Vec<u16>,

    spatial_idx: RTree<NodeEntry>,
}

impl WalkNetwork {
    pub fn empty() -> Self {
        WalkNetworkBuilder::new().build()
    }

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        edge.index() < self.edge_count()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn incoming(&self, node: NodeId) -> &[EdgeId] {
        let start = self.node_in_start[node.index()] as usize;
        let end   = self.node_in_start[node.index() + 1] as usize;
        &self.in_edges[start..end]
    }

    /// The first edge from `a` to `b`, if any.
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.out_edges(a).find(|e| self.edge_to[e.index()] == b)
    }

    // ── Lanes ─────────────────────────────────────────────────────────────

    /// Every lane of every edge, edge-major.
    pub fn lane_ids(&self) -> impl Iterator<Item = LaneId> + '_ {
        self.edge_lanes
            .iter()
            .enumerate()
            .flat_map(|(e, &n)| (0..n).map(move |i| LaneId::new(EdgeId(e as u32), i)))
    }

    /// Length of `lane` in metres, or `None` if it does not exist.
    pub fn lane_length(&self, lane: LaneId) -> Option<f64> {
        let e = lane.edge.index();
        (e < self.edge_count() && lane.index < self.edge_lanes[e])
            .then(|| self.edge_length_m[e] as f64)
    }

    /// First shape point of `lane` (the edge's source node).
    pub fn lane_geo(&self, lane: LaneId) -> Option<GeoPoint> {
        self.lane_length(lane)?;
        Some(self.node_pos[self.edge_from[lane.edge.index()].index()])
    }

    /// Planar position `offset` metres along `edge`.
    pub fn point_along(&self, edge: EdgeId, offset: f64) -> Position {
        let e = edge.index();
        let a = self.node_xy[self.edge_from[e].index()];
        let b = self.node_xy[self.edge_to[e].index()];
        let len = self.edge_length_m[e] as f64;
        let t = if len > 0.0 { offset / len } else { 1.0 };
        a.lerp(b, t)
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nearest node to `pos`.  `None` only if the network has no nodes.
    pub fn snap_to_node(&self, pos: GeoPoint) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|e| e.id)
    }
}

// ── WalkNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`WalkNetwork`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use cf_core::GeoPoint;
/// use cf_spatial::WalkNetworkBuilder;
///
/// let mut b = WalkNetworkBuilder::new();
/// let a = b.add_node(GeoPoint::new(33.9380, -84.5200));
/// let c = b.add_node(GeoPoint::new(33.9390, -84.5200));
/// b.add_walkway(a, c, 111.0, 1);
/// let net = b.build();
/// assert_eq!(net.edge_count(), 2); // both directions
/// ```
pub struct WalkNetworkBuilder {
    nodes:     Vec<GeoPoint>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:      NodeId,
    to:        NodeId,
    length_m:  f32,
    travel_ms: u32,
    lanes:     u16,
}

/// Walking speed used to derive a default historical travel time.
const NOMINAL_WALK_MPS: f32 = 1.4;

impl WalkNetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// Add a **directed** edge.  `lanes` is clamped to at least 1.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, length_m: f32, travel_ms: u32, lanes: u16) {
        self.raw_edges.push(RawEdge { from, to, length_m, travel_ms, lanes: lanes.max(1) });
    }

    /// Add both directions of a walkway, with travel time at a nominal
    /// walking pace.
    pub fn add_walkway(&mut self, a: NodeId, b: NodeId, length_m: f32, lanes: u16) {
        let travel_ms = (length_m / NOMINAL_WALK_MPS * 1000.0) as u32;
        self.add_directed_edge(a, b, length_m, travel_ms, lanes);
        self.add_directed_edge(b, a, length_m, travel_ms, lanes);
    }

    /// Like [`add_walkway`](Self::add_walkway) with the length taken from
    /// the great-circle distance between the two nodes.
    pub fn connect(&mut self, a: NodeId, b: NodeId, lanes: u16) {
        let len = self.nodes[a.index()].distance_m(self.nodes[b.index()]) as f32;
        self.add_walkway(a, b, len, lanes);
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder.  Edge ids follow source-node order.
    pub fn build(self) -> WalkNetwork {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let edge_from:      Vec<NodeId> = raw.iter().map(|e| e.from).collect();
        let edge_to:        Vec<NodeId> = raw.iter().map(|e| e.to).collect();
        let edge_length_m:  Vec<f32>    = raw.iter().map(|e| e.length_m).collect();
        let edge_travel_ms: Vec<u32>    = raw.iter().map(|e| e.travel_ms).collect();
        let edge_lanes:     Vec<u16>    = raw.iter().map(|e| e.lanes).collect();

        let node_out_start = row_pointer(node_count, edge_from.iter());
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        // Incoming CSR: stable sort of edge ids by destination.
        let node_in_start = row_pointer(node_count, edge_to.iter());
        let mut in_edges: Vec<EdgeId> = (0..edge_count as u32).map(EdgeId).collect();
        in_edges.sort_by_key(|e| edge_to[e.index()].0);

        let origin = self.nodes.first().copied().unwrap_or(GeoPoint::new(0.0, 0.0));
        let node_xy = self.nodes.iter().map(|p| p.to_local(origin)).collect();

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry { point: [pos.lat, pos.lon], id: NodeId(i as u32) })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        WalkNetwork {
            node_pos: self.nodes,
            node_xy,
            origin,
            node_out_start,
            node_in_start,
            in_edges,
            edge_from,
            edge_to,
            edge_length_m,
            edge_travel_ms,
            edge_lanes,
            spatial_idx,
        }
    }
}

impl Default for WalkNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn row_pointer<'a>(node_count: usize, keys: impl Iterator<Item = &'a NodeId>) -> Vec<u32> {
    let mut start = vec![0u32; node_count + 1];
    for n in keys {
        start[n.index() + 1] += 1;
    }
    for i in 1..=node_count {
        start[i] += start[i - 1];
    }
    start
}
