//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The `Display` form matches the
//! identifiers the stepper and output files use (`ped_12`, `bldg_3`, `41_0`).

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty) => $fmt:literal;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, $fmt, self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// A pedestrian injected into the stepper.  Unique within one run.
    pub struct EntityId(u32) => "ped_{}";
}

typed_id! {
    /// A campus building (origin or destination of a walk).
    pub struct BuildingId(u32) => "bldg_{}";
}

typed_id! {
    /// A junction of the walkway network.  Only reference collaborators that
    /// own a graph use it; the engine speaks in edges.
    pub struct NodeId(u32) => "n{}";
}

typed_id! {
    /// A directed segment of the walkway network, the unit of route
    /// composition.
    pub struct EdgeId(u32) => "{}";
}

// ── LaneId ────────────────────────────────────────────────────────────────────

/// One lane of an edge.  Pedestrian density is measured per lane.
///
/// Displayed as `<edge>_<index>`, the naming the stepper uses for lanes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneId {
    pub edge:  EdgeId,
    pub index: u16,
}

impl LaneId {
    #[inline]
    pub fn new(edge: EdgeId, index: u16) -> Self {
        Self { edge, index }
    }

    /// The first (sidewalk) lane of `edge`.
    #[inline]
    pub fn primary(edge: EdgeId) -> Self {
        Self { edge, index: 0 }
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.edge, self.index)
    }
}
