//! Geographic and planar coordinate types.
//!
//! `GeoPoint` uses `f64` latitude/longitude: building coordinates come from
//! the schedule store with six or more decimals, and snapping is cached on
//! rounded coordinates, so single precision would merge distinct buildings.
//!
//! `Position` is a planar `(x, y)` in metres, the frame the stepper reports
//! entity positions in.

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        const R: f64 = 6_371_000.0; // mean Earth radius, metres

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        R * c
    }

    /// Integer key of the coordinate rounded to `decimals` places.
    ///
    /// Two points with the same key are treated as the same snapping query.
    /// Five decimals is roughly one metre on a campus.
    pub fn rounded_key(self, decimals: u32) -> (i64, i64) {
        let scale = 10f64.powi(decimals as i32);
        (
            (self.lat * scale).round() as i64,
            (self.lon * scale).round() as i64,
        )
    }

    /// Equirectangular projection into metres relative to `origin`.
    ///
    /// Accurate to well under a metre over a campus-sized extent.
    pub fn to_local(self, origin: GeoPoint) -> Position {
        const M_PER_DEG: f64 = 111_320.0;
        let x = (self.lon - origin.lon) * M_PER_DEG * origin.lat.to_radians().cos();
        let y = (self.lat - origin.lat) * M_PER_DEG;
        Position { x, y }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

// ── Position ──────────────────────────────────────────────────────────────────

/// Planar position in metres, as reported by the stepper.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in metres.
    #[inline]
    pub fn distance(self, other: Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation toward `other` by `t ∈ [0, 1]`.
    #[inline]
    pub fn lerp(self, other: Position, t: f64) -> Position {
        let t = t.clamp(0.0, 1.0);
        Position {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}
