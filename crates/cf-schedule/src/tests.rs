//! Unit tests for cf-schedule.

use cf_core::{BuildingId, GeoPoint, TimeOfDay};

use crate::{DayType, OccupancyRow, SpawnEvent, SpawnQueue};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn tod(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

fn event(building: u32, at: &str, count: u32) -> SpawnEvent {
    SpawnEvent {
        building_id:     BuildingId(building),
        time_of_day:     tod(at),
        occupancy_count: count,
        origin:          GeoPoint::new(33.94, -84.52),
    }
}

fn row(building: u32, end: &str, occupancy: i64, day_type: DayType) -> OccupancyRow {
    OccupancyRow {
        building_id: BuildingId(building),
        name:        format!("B{building}"),
        location:    GeoPoint::new(33.94, -84.52),
        start_time:  TimeOfDay::MIDNIGHT,
        end_time:    tod(end),
        occupancy,
        day_type,
    }
}

const OCCUPANCY_CSV: &str = "\
building_id,name,lat,lon,start_time,end_time,occupancy_value,day_type
1,Atrium,33.938286,-84.518969,07:00:00,08:00:00,5,MWF
2,Library,33.940275,-84.520132,09:30:00,10:45:00,40,TTh
3,Gym,33.939000,-84.521000,08:00:00,09:00:00,0,MWF
4,Lab,33.941000,-84.519000,06:00,07:30,-3,MWF
2,Library,33.940275,-84.520132,06:00:00,07:15:00,12,mwf
";

const BUILDINGS_CSV: &str = "\
building_id,name,lat,lon
1,Atrium,33.938286,-84.518969
2,Library,33.940275,-84.520132
";

// ── DayType ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod day_type {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for d in DayType::ROTATION {
            assert_eq!(d.label().parse::<DayType>().unwrap(), d);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("ttH_peak".parse::<DayType>().unwrap(), DayType::TthPeak);
        assert!("Funday".parse::<DayType>().is_err());
    }

    #[test]
    fn peak_variants() {
        let peaks: Vec<_> = DayType::ROTATION.into_iter().filter(|d| d.is_peak()).collect();
        assert_eq!(peaks, vec![DayType::MwfPeak, DayType::TthPeak, DayType::WeekendPeak]);
    }
}

// ── OccupancyRow → SpawnEvent ─────────────────────────────────────────────────

#[cfg(test)]
mod events {
    use super::*;
    use crate::{MemoryScheduleSource, ScheduleSource, events_from_rows};

    #[test]
    fn event_fires_at_end_time() {
        let e = row(1, "08:00:00", 5, DayType::Mwf).to_event().unwrap();
        assert_eq!(e.time_of_day.secs(), 28_800);
        assert_eq!(e.occupancy_count, 5);
    }

    #[test]
    fn non_positive_occupancy_dropped() {
        assert!(row(1, "08:00:00", 0, DayType::Mwf).to_event().is_none());
        assert!(row(1, "08:00:00", -4, DayType::Mwf).to_event().is_none());
    }

    #[test]
    fn filtered_by_day_type_and_sorted() {
        let rows = vec![
            row(2, "10:00:00", 3, DayType::Mwf),
            row(1, "09:00:00", 3, DayType::Mwf),
            row(9, "08:00:00", 3, DayType::Tth),
        ];
        let events = events_from_rows(&rows, DayType::Mwf);
        let ids: Vec<u32> = events.iter().map(|e| e.building_id.0).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn memory_source() {
        let src = MemoryScheduleSource::new(vec![row(1, "08:00:00", 5, DayType::Base)], vec![]);
        assert_eq!(src.events_for(DayType::Base).unwrap().len(), 1);
        assert!(src.events_for(DayType::Weekend).unwrap().is_empty());
        assert!(src.buildings().unwrap().is_empty());
    }
}

// ── CSV loader ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::Cursor;

    use super::*;
    use crate::{
        CsvScheduleSource, ScheduleError, ScheduleSource, load_buildings_reader,
        load_occupancy_reader,
    };

    #[test]
    fn parses_all_rows() {
        let rows = load_occupancy_reader(Cursor::new(OCCUPANCY_CSV)).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].name, "Atrium");
        assert_eq!(rows[3].end_time, tod("07:30:00"));
        assert_eq!(rows[4].day_type, DayType::Mwf);
    }

    #[test]
    fn bad_time_is_parse_error() {
        let csv = "building_id,name,lat,lon,start_time,end_time,occupancy_value,day_type\n\
                   1,A,0,0,7am,08:00:00,5,MWF\n";
        let err = load_occupancy_reader(Cursor::new(csv)).unwrap_err();
        assert!(matches!(err, ScheduleError::Parse(ref m) if m.contains("line 2")), "{err}");
    }

    #[test]
    fn bad_day_type_is_parse_error() {
        let csv = "building_id,name,lat,lon,start_time,end_time,occupancy_value,day_type\n\
                   1,A,0,0,07:00:00,08:00:00,5,Holiday\n";
        assert!(matches!(
            load_occupancy_reader(Cursor::new(csv)),
            Err(ScheduleError::Parse(_))
        ));
    }

    #[test]
    fn buildings_reader() {
        let b = load_buildings_reader(Cursor::new(BUILDINGS_CSV)).unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b[1].id, BuildingId(2));
        assert!((b[1].location.lat - 33.940275).abs() < 1e-9);
    }

    #[test]
    fn csv_source_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("occupancy.csv"), OCCUPANCY_CSV).unwrap();
        std::fs::write(dir.path().join("buildings.csv"), BUILDINGS_CSV).unwrap();

        let src = CsvScheduleSource::new(dir.path());
        let mwf = src.events_for(DayType::Mwf).unwrap();
        // Gym (0) and Lab (-3) are dropped; Library 07:15 sorts before Atrium 08:00.
        let keys: Vec<(u32, String)> = mwf
            .iter()
            .map(|e| (e.building_id.0, e.time_of_day.to_string()))
            .collect();
        assert_eq!(keys, vec![(2, "07:15:00".into()), (1, "08:00:00".into())]);
        assert_eq!(src.buildings().unwrap().len(), 2);
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let src = CsvScheduleSource::new(dir.path());
        assert!(matches!(
            src.events_for(DayType::Base),
            Err(ScheduleError::DataUnavailable(_))
        ));
        assert!(matches!(src.buildings(), Err(ScheduleError::DataUnavailable(_))));
    }
}

// ── SpawnQueue ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod spawn_queue {
    use std::collections::HashSet;

    use super::*;
    use crate::SpawnKey;

    #[test]
    fn events_at_exact_time() {
        let q = SpawnQueue::from_events([event(1, "08:00:00", 5), event(2, "09:00:00", 1)]);
        assert_eq!(q.events_at(tod("08:00:00")).len(), 1);
        assert!(q.events_at(tod("08:00:01")).is_empty());
        assert_eq!(q.len(), 2);
        assert_eq!(q.time_count(), 2);
    }

    #[test]
    fn duplicate_keys_merge() {
        let q = SpawnQueue::from_events([event(1, "08:00:00", 5), event(1, "08:00:00", 3)]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.events_at(tod("08:00:00"))[0].occupancy_count, 8);
        assert_eq!(q.total_occupancy(), 8);
    }

    #[test]
    fn pending_window() {
        let q = SpawnQueue::from_events([event(1, "08:00:00", 5)]);
        let none: HashSet<SpawnKey> = HashSet::new();
        let is_consumed = |k: &SpawnKey| none.contains(k);

        assert!(q.has_pending_within(tod("07:00:00"), 3_601, is_consumed));
        assert!(!q.has_pending_within(tod("07:00:00"), 3_600, is_consumed));
        assert!(!q.has_pending_within(tod("08:00:01"), 1_000, is_consumed));
        assert!(!q.has_pending_within(tod("07:00:00"), 0, is_consumed));
    }

    #[test]
    fn pending_window_wraps_midnight() {
        let q = SpawnQueue::from_events([event(1, "00:10:00", 1)]);
        let is_consumed = |_: &SpawnKey| false;
        assert!(q.has_pending_within(tod("23:50:00"), 1_800, is_consumed));
        assert!(!q.has_pending_within(tod("23:50:00"), 600, is_consumed));
    }

    #[test]
    fn consumed_keys_are_not_pending() {
        let e = event(1, "08:00:00", 5);
        let q = SpawnQueue::from_events([e]);
        let consumed: HashSet<SpawnKey> = [e.key()].into_iter().collect();
        assert!(!q.has_pending_within(TimeOfDay::MIDNIGHT, 86_400, |k| consumed.contains(k)));
        assert!(q.has_pending_within(TimeOfDay::MIDNIGHT, 86_400, |_| false));
    }
}
