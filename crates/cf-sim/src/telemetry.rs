//! One sampling tick's view of the live entities.

use cf_core::{EntityId, LaneId, Position};
use cf_mobility::{Stepper, StepperError};

use crate::{SimError, SimResult};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EntityTelemetry {
    pub id:           EntityId,
    pub lane:         LaneId,
    pub position:     Position,
    /// m/s.
    pub speed:        f64,
    /// Seconds standing still.
    pub waiting_time: f64,
}

/// Query every id in `live`, in order.
///
/// An entity the stepper stops recognising between the id listing and the
/// query (it arrived, or the stepper faulted on it) is left out.  Only a
/// session fault aborts.
pub fn collect_telemetry<S: Stepper + ?Sized>(stepper: &S, live: &[EntityId]) -> SimResult<Vec<EntityTelemetry>> {
    let mut out = Vec::with_capacity(live.len());
    for &id in live {
        match probe(stepper, id) {
            Ok(t) => out.push(t),
            Err(e) if e.is_session_fault() => return Err(SimError::SessionFault(e.to_string())),
            Err(e) => tracing::debug!(entity = %id, error = %e, "telemetry unavailable, skipping entity"),
        }
    }
    Ok(out)
}

fn probe<S: Stepper + ?Sized>(stepper: &S, id: EntityId) -> Result<EntityTelemetry, StepperError> {
    Ok(EntityTelemetry {
        id,
        lane:         stepper.lane_of(id)?,
        position:     stepper.position(id)?,
        speed:        stepper.speed(id)?,
        waiting_time: stepper.waiting_time(id)?,
    })
}
