//! Synthetic campus walkway network.
//!
//! Eight junctions laid out around a central green, loosely following the
//! footprint of a mid-sized suburban campus.  Five of them sit at building
//! entrances; the rest are path crossings.

use cf_core::{GeoPoint, NodeId};
use cf_spatial::{WalkNetwork, WalkNetworkBuilder};

/// Building entrances, in the order they appear in the embedded schedule.
pub const BUILDINGS: [(&str, f64, f64); 5] = [
    ("Atrium",         33.938286, -84.518969),
    ("Library",        33.940275, -84.520132),
    ("Engineering",    33.941640, -84.517420),
    ("Student Center", 33.939410, -84.515880),
    ("Recreation",     33.936850, -84.516750),
];

/// Build the campus network.
///
/// Returns `(network, entrances)` where `entrances[i]` is the node at
/// `BUILDINGS[i]`.
pub fn build_campus() -> (WalkNetwork, [NodeId; 5]) {
    let mut b = WalkNetworkBuilder::new();

    let entrances = BUILDINGS.map(|(_, lat, lon)| b.add_node(GeoPoint::new(lat, lon)));
    let [atrium, library, engineering, student_center, recreation] = entrances;

    let green_north = b.add_node(GeoPoint::new(33.940100, -84.518100));
    let green_south = b.add_node(GeoPoint::new(33.938900, -84.517600));
    let east_gate   = b.add_node(GeoPoint::new(33.937900, -84.515200));

    // Main quad: wide paths.
    b.connect(atrium,      green_south,    3);
    b.connect(green_south, green_north,    3);
    b.connect(green_north, library,        2);
    b.connect(green_north, engineering,    2);
    b.connect(green_south, student_center, 2);

    // Side paths: single lane.
    b.connect(atrium,         library,     1);
    b.connect(student_center, engineering, 1);
    b.connect(student_center, east_gate,   1);
    b.connect(east_gate,      recreation,  1);
    b.connect(recreation,     atrium,      1);

    (b.build(), entrances)
}
