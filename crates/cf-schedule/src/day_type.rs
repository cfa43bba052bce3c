//! Day types — which occupancy pattern a run simulates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ScheduleError;

/// A named occupancy pattern.
///
/// The label (`"MWF"`, `"TTh_Peak"`, …) is the value stored in the `day_type`
/// column of the schedule store and the prefix of every output file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayType {
    #[serde(rename = "Base")]
    Base,
    #[serde(rename = "LTP")]
    LowTraffic,
    #[serde(rename = "MWF")]
    Mwf,
    #[serde(rename = "TTh")]
    Tth,
    #[serde(rename = "SSu")]
    Weekend,
    #[serde(rename = "MWF_Peak")]
    MwfPeak,
    #[serde(rename = "TTh_Peak")]
    TthPeak,
    #[serde(rename = "SSu_Peak")]
    WeekendPeak,
}

impl DayType {
    /// Every day type, in the order a full campaign visits them.
    pub const ROTATION: [DayType; 8] = [
        DayType::Base,
        DayType::LowTraffic,
        DayType::Mwf,
        DayType::Tth,
        DayType::Weekend,
        DayType::MwfPeak,
        DayType::TthPeak,
        DayType::WeekendPeak,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DayType::Base        => "Base",
            DayType::LowTraffic  => "LTP",
            DayType::Mwf         => "MWF",
            DayType::Tth         => "TTh",
            DayType::Weekend     => "SSu",
            DayType::MwfPeak     => "MWF_Peak",
            DayType::TthPeak     => "TTh_Peak",
            DayType::WeekendPeak => "SSu_Peak",
        }
    }

    pub fn is_peak(self) -> bool {
        matches!(self, DayType::MwfPeak | DayType::TthPeak | DayType::WeekendPeak)
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DayType {
    type Err = ScheduleError;

    /// Case-insensitive match on the label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        DayType::ROTATION
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| ScheduleError::Parse(format!("unknown day type {s:?}")))
    }
}
