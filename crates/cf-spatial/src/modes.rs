//! Routing-mode selection.

use rand::distributions::{Distribution, WeightedIndex};

use cf_core::SimRng;

use crate::{OracleError, OracleResult, RoutingMode};

/// Relative weights of the three routing modes.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModeWeights {
    pub shortest:         f64,
    pub congestion_aware: f64,
    pub historical:       f64,
}

impl Default for ModeWeights {
    fn default() -> Self {
        Self { shortest: 0.5, congestion_aware: 0.3, historical: 0.2 }
    }
}

impl ModeWeights {
    fn as_array(&self) -> [f64; 3] {
        [self.shortest, self.congestion_aware, self.historical]
    }

    /// Weights must be finite, non-negative, and not all zero.
    pub fn validate(&self) -> OracleResult<()> {
        let w = self.as_array();
        if w.iter().any(|x| !x.is_finite() || *x < 0.0) {
            return Err(OracleError::InvalidWeights(format!("{w:?}")));
        }
        if w.iter().sum::<f64>() <= 0.0 {
            return Err(OracleError::InvalidWeights("all weights are zero".into()));
        }
        Ok(())
    }
}

// ── ModeSelector trait ────────────────────────────────────────────────────────

/// Picks the routing mode for the next oracle attempt.
pub trait ModeSelector {
    fn next_mode(&mut self, rng: &mut SimRng) -> RoutingMode;
}

/// Weighted random choice, used outside tests.
pub struct WeightedModes {
    dist: WeightedIndex<f64>,
}

impl WeightedModes {
    pub fn new(weights: ModeWeights) -> OracleResult<Self> {
        weights.validate()?;
        let dist = WeightedIndex::new(weights.as_array())
            .map_err(|e| OracleError::InvalidWeights(e.to_string()))?;
        Ok(Self { dist })
    }
}

impl ModeSelector for WeightedModes {
    fn next_mode(&mut self, rng: &mut SimRng) -> RoutingMode {
        RoutingMode::ALL[self.dist.sample(rng.inner())]
    }
}

/// Replays a fixed sequence, cycling when exhausted.  For tests.
pub struct ScriptedModes {
    seq: Vec<RoutingMode>,
    pos: usize,
}

impl ScriptedModes {
    /// `seq` must be non-empty; an empty script behaves as `[Shortest]`.
    pub fn new(seq: Vec<RoutingMode>) -> Self {
        let seq = if seq.is_empty() { vec![RoutingMode::Shortest] } else { seq };
        Self { seq, pos: 0 }
    }
}

impl ModeSelector for ScriptedModes {
    fn next_mode(&mut self, _rng: &mut SimRng) -> RoutingMode {
        let mode = self.seq[self.pos % self.seq.len()];
        self.pos += 1;
        mode
    }
}
