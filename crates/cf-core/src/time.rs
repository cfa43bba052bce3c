//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter; one tick is one
//! simulated second.  A run covers one campus day, so the mapping to the
//! schedule's clock is:
//!
//!   time_of_day = (start_time_of_day + tick) mod 86 400
//!
//! Using an integer tick means schedule lookups are exact (no floating-point
//! drift) and every `TimeOfDay` inside the 24-hour horizon is visited exactly
//! once per run.

use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Seconds in one simulated day; the default run horizon.
pub const SECS_PER_DAY: u32 = 86_400;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter (one simulated second).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Ticks elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// `true` when this tick falls on a sampling boundary.
    #[inline]
    pub fn is_multiple_of(self, interval: u64) -> bool {
        interval > 0 && self.0 % interval == 0
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── TimeOfDay ─────────────────────────────────────────────────────────────────

/// Seconds since midnight, always `< 86 400`.
///
/// Parsed from and displayed as `HH:MM:SS`, the format occupancy schedules
/// use for `start_time` / `end_time`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    /// Wrap an arbitrary second count into a time of day.
    #[inline]
    pub fn from_secs(secs: u32) -> Self {
        TimeOfDay(secs % SECS_PER_DAY)
    }

    /// Build from clock components.  Out-of-range components are rejected.
    pub fn from_hms(h: u32, m: u32, s: u32) -> Result<Self, CoreError> {
        if h >= 24 || m >= 60 || s >= 60 {
            return Err(CoreError::TimeOfDay(format!("{h:02}:{m:02}:{s:02}")));
        }
        Ok(TimeOfDay(h * 3_600 + m * 60 + s))
    }

    #[inline]
    pub fn secs(self) -> u32 {
        self.0
    }

    /// The time of day `ticks` seconds later, wrapping at midnight.
    #[inline]
    pub fn after(self, ticks: u64) -> TimeOfDay {
        TimeOfDay(((self.0 as u64 + ticks) % SECS_PER_DAY as u64) as u32)
    }

    /// `(hours, minutes, seconds)` components.
    pub fn hms(self) -> (u32, u32, u32) {
        (self.0 / 3_600, (self.0 % 3_600) / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = CoreError;

    /// Accepts `HH:MM:SS` or `HH:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || CoreError::TimeOfDay(s.to_owned());
        let mut parts = s.trim().split(':');
        let mut next = |required: bool| -> Result<u32, CoreError> {
            match parts.next() {
                Some(p) => p.trim().parse::<u32>().map_err(|_| bad()),
                None if required => Err(bad()),
                None => Ok(0),
            }
        };
        let h = next(true)?;
        let m = next(true)?;
        let sec = next(false)?;
        if parts.next().is_some() {
            return Err(bad());
        }
        TimeOfDay::from_hms(h, m, sec).map_err(|_| bad())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = self.hms();
        write!(f, "{h:02}:{m:02}:{s:02}")
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the current tick of a run and maps it onto the schedule's clock.
///
/// `SimClock` is cheap to copy and holds no heap data.
#[derive(Clone, Copy, Debug)]
pub struct SimClock {
    /// Time of day at tick 0.
    pub start: TimeOfDay,
    /// The current tick, advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(start: TimeOfDay) -> Self {
        Self { start, current_tick: Tick::ZERO }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Time of day corresponding to `current_tick`.
    #[inline]
    pub fn time_of_day(&self) -> TimeOfDay {
        self.start.after(self.current_tick.0)
    }

    /// Time of day corresponding to an arbitrary tick of this run.
    #[inline]
    pub fn time_of_day_at(&self, tick: Tick) -> TimeOfDay {
        self.start.after(tick.0)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.current_tick, self.time_of_day())
    }
}

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Per-run timing configuration.
///
/// Usually embedded in the campaign configuration loaded by the application.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunConfig {
    /// Ticks to simulate before a run is cut off.  Default: one day.
    pub horizon_ticks: u64,

    /// Congestion, rerouting and statistics run every N ticks.  Default: 60.
    pub sampling_interval_ticks: u64,

    /// Time of day at tick 0.  Default: midnight.
    pub start_time_of_day: TimeOfDay,

    /// Master RNG seed.  The same seed always produces identical runs.
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            horizon_ticks:           SECS_PER_DAY as u64,
            sampling_interval_ticks: 60,
            start_time_of_day:       TimeOfDay::MIDNIGHT,
            seed:                    42,
        }
    }
}

impl RunConfig {
    /// The tick at which the run ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.horizon_ticks)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_time_of_day)
    }

    /// `true` if congestion/statistics sampling happens on `tick`.
    #[inline]
    pub fn is_sampling_tick(&self, tick: Tick) -> bool {
        tick.is_multiple_of(self.sampling_interval_ticks)
    }

    /// Reject configurations the run loop cannot honour.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.horizon_ticks == 0 {
            return Err(CoreError::Config("horizon_ticks must be > 0".into()));
        }
        if self.sampling_interval_ticks == 0 {
            return Err(CoreError::Config("sampling_interval_ticks must be > 0".into()));
        }
        Ok(())
    }
}
