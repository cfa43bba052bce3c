//! Unit tests for cf-spatial.
//!
//! All tests use hand-crafted networks or scripted oracles.

#[cfg(test)]
mod helpers {
    use std::cell::{Cell, RefCell};

    use cf_core::{EdgeId, GeoPoint, NodeId};

    use crate::{
        EdgePosition, OracleError, OracleResult, RouteOracle, RouteRequest, RoutingMode,
        WalkNetwork, WalkNetworkBuilder,
    };

    fn two_way(b: &mut WalkNetworkBuilder, x: NodeId, y: NodeId, len: f32, travel_ms: u32, lanes: u16) {
        b.add_directed_edge(x, y, len, travel_ms, lanes);
        b.add_directed_edge(y, x, len, travel_ms, lanes);
    }

    /// Nodes:
    ///
    /// ```text
    ///   5 ── 0 ── 1 ── 2 ── 4 ── 6
    ///         \            /
    ///          ──── 3 ─────
    /// ```
    ///
    /// Upper path 0→1→2→4: 300 m, 30 s, two lanes.
    /// Lower path 0→3→4:   250 m, 70 s, one lane.
    ///
    /// Shortest takes the lower path; Historical and CongestionAware the upper.
    pub fn campus() -> (WalkNetwork, [NodeId; 7]) {
        let mut b = WalkNetworkBuilder::new();
        let n0 = b.add_node(GeoPoint::new(33.9400, -84.5200));
        let n1 = b.add_node(GeoPoint::new(33.9410, -84.5190));
        let n2 = b.add_node(GeoPoint::new(33.9410, -84.5180));
        let n3 = b.add_node(GeoPoint::new(33.9390, -84.5185));
        let n4 = b.add_node(GeoPoint::new(33.9400, -84.5170));
        let n5 = b.add_node(GeoPoint::new(33.9400, -84.5210));
        let n6 = b.add_node(GeoPoint::new(33.9400, -84.5160));

        two_way(&mut b, n5, n0, 50.0, 5_000, 1);
        two_way(&mut b, n0, n1, 100.0, 10_000, 2);
        two_way(&mut b, n1, n2, 100.0, 10_000, 2);
        two_way(&mut b, n2, n4, 100.0, 10_000, 2);
        two_way(&mut b, n0, n3, 200.0, 60_000, 1);
        two_way(&mut b, n3, n4, 50.0, 10_000, 1);
        two_way(&mut b, n4, n6, 50.0, 5_000, 1);

        (b.build(), [n0, n1, n2, n3, n4, n5, n6])
    }

    /// Fails the first `failures` route calls, then answers `[start, end]`.
    /// Records every requested mode.
    pub struct FlakyOracle {
        pub failures:     Cell<u32>,
        pub empty:        bool,
        pub modes:        RefCell<Vec<RoutingMode>>,
        pub locate_calls: Cell<u32>,
    }

    impl FlakyOracle {
        pub fn new(failures: u32) -> Self {
            Self {
                failures:     Cell::new(failures),
                empty:        false,
                modes:        RefCell::new(Vec::new()),
                locate_calls: Cell::new(0),
            }
        }

        /// Answers every route call with an empty edge list.
        pub fn empty() -> Self {
            Self { empty: true, ..Self::new(0) }
        }
    }

    impl RouteOracle for FlakyOracle {
        fn locate(&self, point: GeoPoint) -> OracleResult<EdgePosition> {
            self.locate_calls.set(self.locate_calls.get() + 1);
            if point.lat > 89.0 {
                return Err(OracleError::NotLocatable(point));
            }
            Ok(EdgePosition { edge: EdgeId(self.locate_calls.get()), offset: 0.0, lane_index: 0 })
        }

        fn route(&self, req: &RouteRequest) -> OracleResult<Vec<EdgeId>> {
            self.modes.borrow_mut().push(req.mode);
            if self.empty {
                return Ok(Vec::new());
            }
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(OracleError::Unavailable("connection refused".into()));
            }
            Ok(vec![req.start, req.end])
        }
    }
}

// ── Network structure ─────────────────────────────────────────────────────────

#[cfg(test)]
mod network {
    use cf_core::{EdgeId, GeoPoint, LaneId};

    use super::helpers::campus;
    use crate::WalkNetworkBuilder;

    #[test]
    fn empty_build() {
        let net = WalkNetworkBuilder::new().build();
        assert_eq!(net.node_count(), 0);
        assert_eq!(net.edge_count(), 0);
        assert!(net.is_empty());
        assert!(net.snap_to_node(GeoPoint::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn csr_out_edges_belong_to_source() {
        let (net, nodes) = campus();
        for n in nodes {
            for e in net.out_edges(n) {
                assert_eq!(net.edge_from[e.index()], n);
            }
            for &e in net.incoming(n) {
                assert_eq!(net.edge_to[e.index()], n);
            }
        }
        assert_eq!(net.edge_count(), 14);
    }

    #[test]
    fn lanes_enumerated_edge_major() {
        let (net, [n0, n1, ..]) = campus();
        let e01 = net.edge_between(n0, n1).unwrap();
        let lanes: Vec<LaneId> = net.lane_ids().filter(|l| l.edge == e01).collect();
        assert_eq!(lanes, vec![LaneId::new(e01, 0), LaneId::new(e01, 1)]);
        assert_eq!(net.lane_ids().count(), 20);
    }

    #[test]
    fn lane_length_and_geo() {
        let (net, [n0, n1, ..]) = campus();
        let e01 = net.edge_between(n0, n1).unwrap();
        assert_eq!(net.lane_length(LaneId::new(e01, 1)), Some(100.0));
        assert_eq!(net.lane_length(LaneId::new(e01, 2)), None);
        assert_eq!(net.lane_length(LaneId::primary(EdgeId(999))), None);
        assert_eq!(net.lane_geo(LaneId::primary(e01)), Some(net.node_pos[n0.index()]));
    }

    #[test]
    fn connect_uses_great_circle_length() {
        let mut b = WalkNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(33.0, -84.0));
        let c = b.add_node(GeoPoint::new(33.001, -84.0));
        b.connect(a, c, 1);
        let net = b.build();
        assert!((net.edge_length_m[0] - 111.2).abs() < 1.0);
    }

    #[test]
    fn point_along_interpolates() {
        let (net, [n0, n1, ..]) = campus();
        let e = net.edge_between(n0, n1).unwrap();
        let start = net.point_along(e, 0.0);
        let end = net.point_along(e, 100.0);
        let mid = net.point_along(e, 50.0);
        assert!(start.distance(net.node_xy[n0.index()]) < 1e-9);
        assert!(end.distance(net.node_xy[n1.index()]) < 1e-9);
        assert!((start.distance(mid) - mid.distance(end)).abs() < 1e-6);
    }
}

// ── DijkstraOracle ────────────────────────────────────────────────────────────

#[cfg(test)]
mod dijkstra {
    use std::sync::Arc;

    use cf_core::EdgeId;

    use super::helpers::campus;
    use crate::{DijkstraOracle, OracleError, RouteOracle, RouteRequest, RoutingMode};

    fn setup() -> (DijkstraOracle, EdgeId, EdgeId, Vec<cf_core::NodeId>) {
        let (net, nodes) = campus();
        let [n0, _, _, _, n4, n5, n6] = nodes;
        let start = net.edge_between(n5, n0).unwrap();
        let end = net.edge_between(n4, n6).unwrap();
        (DijkstraOracle::new(Arc::new(net)), start, end, nodes.to_vec())
    }

    fn via(oracle: &DijkstraOracle, edges: &[EdgeId]) -> Vec<u32> {
        edges.iter().map(|e| oracle.network().edge_to[e.index()].0).collect()
    }

    #[test]
    fn shortest_takes_lower_path() {
        let (oracle, start, end, _) = setup();
        let r = oracle.route(&RouteRequest::pedestrian(start, end, RoutingMode::Shortest)).unwrap();
        assert_eq!(r.first(), Some(&start));
        assert_eq!(r.last(), Some(&end));
        assert_eq!(via(&oracle, &r), vec![0, 3, 4, 6]);
    }

    #[test]
    fn historical_and_congestion_aware_take_upper_path() {
        let (oracle, start, end, _) = setup();
        for mode in [RoutingMode::Historical, RoutingMode::CongestionAware] {
            let r = oracle.route(&RouteRequest::pedestrian(start, end, mode)).unwrap();
            assert_eq!(via(&oracle, &r), vec![0, 1, 2, 4, 6], "{mode}");
        }
    }

    #[test]
    fn same_edge_is_single_edge_route() {
        let (oracle, start, _, _) = setup();
        let r = oracle.route(&RouteRequest::pedestrian(start, start, RoutingMode::Shortest)).unwrap();
        assert_eq!(r, vec![start]);
    }

    #[test]
    fn adjacent_edges() {
        let (oracle, _, _, nodes) = setup();
        let net = oracle.network();
        let a = net.edge_between(nodes[0], nodes[1]).unwrap();
        let b = net.edge_between(nodes[1], nodes[2]).unwrap();
        let r = oracle.route(&RouteRequest::pedestrian(a, b, RoutingMode::Shortest)).unwrap();
        assert_eq!(r, vec![a, b]);
    }

    #[test]
    fn unknown_edge_is_unavailable() {
        let (oracle, start, _, _) = setup();
        let err = oracle
            .route(&RouteRequest::pedestrian(start, EdgeId(9_999), RoutingMode::Shortest))
            .unwrap_err();
        assert!(matches!(err, OracleError::Unavailable(_)));
    }

    #[test]
    fn disconnected_is_no_route() {
        use cf_core::GeoPoint;
        use crate::WalkNetworkBuilder;

        let mut b = WalkNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 0.001));
        let d = b.add_node(GeoPoint::new(1.0, 0.0));
        let e = b.add_node(GeoPoint::new(1.0, 0.001));
        b.add_walkway(a, c, 100.0, 1);
        b.add_walkway(d, e, 100.0, 1);
        let net = b.build();
        let s = net.edge_between(a, c).unwrap();
        let t = net.edge_between(d, e).unwrap();
        let oracle = DijkstraOracle::new(Arc::new(net));
        let err = oracle.route(&RouteRequest::pedestrian(s, t, RoutingMode::Shortest)).unwrap_err();
        assert_eq!(err, OracleError::NoRoute { from: s, to: t });
    }

    #[test]
    fn locate_snaps_to_nearest_node() {
        let (oracle, _, _, nodes) = setup();
        let net = oracle.network();
        let near_n2 = net.node_pos[nodes[2].index()];
        let pos = oracle.locate(cf_core::GeoPoint::new(near_n2.lat + 1e-5, near_n2.lon)).unwrap();
        assert_eq!(net.edge_from[pos.edge.index()], nodes[2]);
        assert_eq!(pos.offset, 0.0);
        assert_eq!(pos.lane_index, 0);
    }

    #[test]
    fn locate_on_dead_end_uses_incoming_edge() {
        use cf_core::GeoPoint;
        use crate::WalkNetworkBuilder;

        let mut b = WalkNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 0.001));
        b.add_directed_edge(a, c, 80.0, 1_000, 1);
        let oracle = DijkstraOracle::new(Arc::new(b.build()));
        let pos = oracle.locate(GeoPoint::new(0.0, 0.001)).unwrap();
        assert_eq!(pos.offset, 80.0);
    }

    #[test]
    fn locate_on_empty_network_fails() {
        let oracle = DijkstraOracle::new(Arc::new(crate::WalkNetwork::empty()));
        let p = cf_core::GeoPoint::new(1.0, 2.0);
        assert_eq!(oracle.locate(p), Err(OracleError::NotLocatable(p)));
    }
}

// ── Mode selection ────────────────────────────────────────────────────────────

#[cfg(test)]
mod modes {
    use cf_core::SimRng;

    use crate::{ModeSelector, ModeWeights, RoutingMode, ScriptedModes, WeightedModes};

    #[test]
    fn default_weights() {
        let w = ModeWeights::default();
        assert_eq!((w.shortest, w.congestion_aware, w.historical), (0.5, 0.3, 0.2));
        assert!(w.validate().is_ok());
    }

    #[test]
    fn invalid_weights_rejected() {
        let zero = ModeWeights { shortest: 0.0, congestion_aware: 0.0, historical: 0.0 };
        assert!(WeightedModes::new(zero).is_err());
        let neg = ModeWeights { shortest: -1.0, ..ModeWeights::default() };
        assert!(neg.validate().is_err());
        let nan = ModeWeights { historical: f64::NAN, ..ModeWeights::default() };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn single_weight_always_chosen() {
        let w = ModeWeights { shortest: 0.0, congestion_aware: 0.0, historical: 1.0 };
        let mut sel = WeightedModes::new(w).unwrap();
        let mut rng = SimRng::new(7);
        for _ in 0..50 {
            assert_eq!(sel.next_mode(&mut rng), RoutingMode::Historical);
        }
    }

    #[test]
    fn weighted_frequencies_roughly_match() {
        let mut sel = WeightedModes::new(ModeWeights::default()).unwrap();
        let mut rng = SimRng::new(1);
        let n = 10_000;
        let shortest = (0..n)
            .filter(|_| sel.next_mode(&mut rng) == RoutingMode::Shortest)
            .count();
        let frac = shortest as f64 / n as f64;
        assert!((frac - 0.5).abs() < 0.03, "got {frac}");
    }

    #[test]
    fn scripted_cycles() {
        let mut sel = ScriptedModes::new(vec![RoutingMode::Historical, RoutingMode::Shortest]);
        let mut rng = SimRng::new(0);
        let got: Vec<_> = (0..3).map(|_| sel.next_mode(&mut rng)).collect();
        assert_eq!(got, vec![RoutingMode::Historical, RoutingMode::Shortest, RoutingMode::Historical]);
    }
}

// ── RouteOracleClient ─────────────────────────────────────────────────────────

#[cfg(test)]
mod client {
    use cf_core::{EdgeId, GeoPoint, SimRng};

    use super::helpers::FlakyOracle;
    use crate::{ClientConfig, RouteOracleClient, RoutingMode, ScriptedModes};

    fn client(oracle: FlakyOracle, config: ClientConfig) -> RouteOracleClient<FlakyOracle> {
        let script = ScriptedModes::new(vec![
            RoutingMode::Shortest,
            RoutingMode::CongestionAware,
            RoutingMode::Historical,
        ]);
        RouteOracleClient::new(oracle, Box::new(script), config)
    }

    #[test]
    fn locate_is_cached_by_rounded_coordinate() {
        let mut c = client(FlakyOracle::new(0), ClientConfig { locate_precision: 5, ..Default::default() });
        let a = c.locate(GeoPoint::new(33.9382861, -84.5189691)).unwrap();
        let b = c.locate(GeoPoint::new(33.9382859, -84.5189689)).unwrap();
        assert_eq!(a, b);
        assert_eq!(c.oracle().locate_calls.get(), 1);
        assert_eq!(c.stats().locate_hits, 1);
        assert_eq!(c.stats().locate_misses, 1);
    }

    #[test]
    fn locate_cache_is_bounded() {
        let mut c = client(FlakyOracle::new(0), ClientConfig { locate_cache_capacity: 2, ..Default::default() });
        for i in 0..3 {
            c.locate(GeoPoint::new(10.0 + i as f64, 0.0)).unwrap();
        }
        assert_eq!(c.cached_locations(), 2);
        // The oldest entry was evicted, so asking again goes to the oracle.
        c.locate(GeoPoint::new(10.0, 0.0)).unwrap();
        assert_eq!(c.oracle().locate_calls.get(), 4);
    }

    #[test]
    fn locate_errors_are_not_cached() {
        let mut c = client(FlakyOracle::new(0), ClientConfig::default());
        assert!(c.locate(GeoPoint::new(90.0, 0.0)).is_err());
        assert!(c.locate(GeoPoint::new(90.0, 0.0)).is_err());
        assert_eq!(c.oracle().locate_calls.get(), 2);
        assert_eq!(c.cached_locations(), 0);
    }

    #[test]
    fn retries_with_fresh_mode_until_success() {
        let mut c = client(FlakyOracle::new(2), ClientConfig::default());
        let mut rng = SimRng::new(0);
        let answer = c.try_route(EdgeId(1), EdgeId(2), &mut rng).unwrap();
        assert_eq!(answer.edges, vec![EdgeId(1), EdgeId(2)]);
        assert_eq!(answer.mode, Some(RoutingMode::Historical));
        assert_eq!(
            *c.oracle().modes.borrow(),
            vec![RoutingMode::Shortest, RoutingMode::CongestionAware, RoutingMode::Historical]
        );
        assert_eq!(c.stats().route_failures, 2);
    }

    #[test]
    fn exhausted_attempts_fall_back_to_direct_route() {
        let mut c = client(FlakyOracle::new(10), ClientConfig::default());
        let mut rng = SimRng::new(0);
        let answer = c.route_or_direct(EdgeId(1), EdgeId(2), &mut rng);
        assert!(answer.is_degenerate());
        assert_eq!(answer.edges, vec![EdgeId(1), EdgeId(2)]);
        assert_eq!(c.oracle().modes.borrow().len(), 3);
        assert_eq!(c.stats().exhausted, 1);

        let same = c.route_or_direct(EdgeId(4), EdgeId(4), &mut rng);
        assert_eq!(same.edges, vec![EdgeId(4)]);
    }

    #[test]
    fn empty_answer_counts_as_failure() {
        let mut c = client(FlakyOracle::empty(), ClientConfig::default());
        let mut rng = SimRng::new(0);
        assert!(c.try_route(EdgeId(1), EdgeId(2), &mut rng).is_none());
        assert_eq!(c.stats().route_failures, 3);
    }

    #[test]
    fn attempt_count_is_configurable() {
        let mut c = client(FlakyOracle::new(10), ClientConfig { max_attempts: 5, ..Default::default() });
        let mut rng = SimRng::new(0);
        assert!(c.try_route(EdgeId(1), EdgeId(2), &mut rng).is_none());
        assert_eq!(c.oracle().modes.borrow().len(), 5);
    }

    #[test]
    fn route_with_mode_is_single_attempt() {
        let mut c = client(FlakyOracle::new(1), ClientConfig::default());
        assert!(c.route_with_mode(EdgeId(1), EdgeId(2), RoutingMode::Historical).is_none());
        assert!(c.route_with_mode(EdgeId(1), EdgeId(2), RoutingMode::Historical).is_some());
    }
}
