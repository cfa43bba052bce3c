//! Unit tests for cf-core primitives.

#[cfg(test)]
mod ids {
    use crate::{BuildingId, EdgeId, EntityId, LaneId};

    #[test]
    fn index_roundtrip() {
        let id = EntityId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(EntityId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(EntityId::INVALID.0, u32::MAX);
        assert_eq!(EdgeId::INVALID.0, u32::MAX);
        assert!(!BuildingId::default().is_valid());
    }

    #[test]
    fn display_matches_stepper_naming() {
        assert_eq!(EntityId(7).to_string(), "ped_7");
        assert_eq!(BuildingId(3).to_string(), "bldg_3");
        assert_eq!(LaneId::primary(EdgeId(41)).to_string(), "41_0");
        assert_eq!(LaneId::new(EdgeId(2), 1).to_string(), "2_1");
    }
}

#[cfg(test)]
mod geo {
    use crate::{GeoPoint, Position};

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(33.938286, -84.518969);
        assert!(p.distance_m(p) < 0.01);
    }

    #[test]
    fn one_degree_latitude() {
        let a = GeoPoint::new(33.0, -84.5);
        let b = GeoPoint::new(34.0, -84.5);
        let d = a.distance_m(b);
        assert!((d - 111_195.0).abs() < 500.0, "got {d}");
    }

    #[test]
    fn rounded_key_merges_nearby_points() {
        let a = GeoPoint::new(33.9382861, -84.5189691);
        let b = GeoPoint::new(33.9382859, -84.5189689);
        let c = GeoPoint::new(33.9402750, -84.5201320);
        assert_eq!(a.rounded_key(5), b.rounded_key(5));
        assert_ne!(a.rounded_key(5), c.rounded_key(5));
    }

    #[test]
    fn local_projection_matches_haversine() {
        let origin = GeoPoint::new(33.938, -84.520);
        let p = GeoPoint::new(33.940, -84.518);
        let local = p.to_local(origin);
        let planar = local.distance(Position::default());
        let great_circle = origin.distance_m(p);
        assert!((planar - great_circle).abs() < 1.0, "{planar} vs {great_circle}");
    }

    #[test]
    fn lerp_clamps() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(10.0, 0.0);
        assert_eq!(a.lerp(b, 0.5), Position::new(5.0, 0.0));
        assert_eq!(a.lerp(b, 2.0), b);
    }
}

#[cfg(test)]
mod time {
    use crate::{RunConfig, SimClock, Tick, TimeOfDay};

    #[test]
    fn tick_arithmetic_never_underflows() {
        let t = Tick(10);
        assert_eq!(t + 5, Tick(15));
        assert_eq!(Tick(15).since(t), 5);
        assert_eq!(Tick(3).since(Tick(10)), 0);
    }

    #[test]
    fn parse_time_of_day() {
        let t: TimeOfDay = "08:00:00".parse().unwrap();
        assert_eq!(t.secs(), 28_800);
        let t: TimeOfDay = "13:05".parse().unwrap();
        assert_eq!(t.secs(), 13 * 3600 + 5 * 60);
        assert!("24:00:00".parse::<TimeOfDay>().is_err());
        assert!("8:61:00".parse::<TimeOfDay>().is_err());
        assert!("noon".parse::<TimeOfDay>().is_err());
        assert!("01:02:03:04".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let t = TimeOfDay::from_hms(7, 4, 9).unwrap();
        assert_eq!(t.to_string(), "07:04:09");
        assert_eq!(t.to_string().parse::<TimeOfDay>().unwrap(), t);
    }

    #[test]
    fn time_of_day_wraps_at_midnight() {
        let t = TimeOfDay::from_hms(23, 59, 30).unwrap();
        assert_eq!(t.after(45).to_string(), "00:00:15");
    }

    #[test]
    fn clock_maps_ticks_to_time_of_day() {
        let mut clock = SimClock::new(TimeOfDay::MIDNIGHT);
        assert_eq!(clock.time_of_day(), TimeOfDay::MIDNIGHT);
        clock.advance();
        assert_eq!(clock.time_of_day().secs(), 1);
        assert_eq!(clock.time_of_day_at(Tick(28_800)).to_string(), "08:00:00");
    }

    #[test]
    fn run_config_sampling() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.end_tick(), Tick(86_400));
        assert!(cfg.is_sampling_tick(Tick(0)));
        assert!(cfg.is_sampling_tick(Tick(120)));
        assert!(!cfg.is_sampling_tick(Tick(61)));
    }

    #[test]
    fn run_config_rejects_zero_interval() {
        let cfg = RunConfig { sampling_interval_ticks: 0, ..RunConfig::default() };
        assert!(cfg.validate().is_err());
        assert!(!cfg.is_sampling_tick(Tick(0)));
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = SimRng::new(12345);
        let mut r2 = SimRng::new(12345);
        for _ in 0..100 {
            let a: f64 = r1.gen_range(0.0..1.0);
            let b: f64 = r2.gen_range(0.0..1.0);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn children_diverge() {
        let mut root = SimRng::new(1);
        let mut c0 = root.child(0);
        let mut c1 = root.child(1);
        let a: u64 = c0.gen_range(0..u64::MAX);
        let b: u64 = c1.gen_range(0..u64::MAX);
        assert_ne!(a, b, "sibling runs should not share a stream");
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = SimRng::new(0);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[9]), Some(&9));
    }
}
