use cf_core::EntityId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepperError {
    /// A command about one entity was rejected.  The entity is skipped and
    /// the run goes on.
    #[error("stepper rejected {entity}: {reason}")]
    Fault { entity: EntityId, reason: String },

    /// The session is gone or was never opened.  Fatal to the campaign.
    #[error("stepper session fault: {0}")]
    Session(String),

    /// The entity is not live in the stepper (never injected, still
    /// pending, or already arrived).
    #[error("{0} is not live")]
    UnknownEntity(EntityId),
}

impl StepperError {
    pub fn fault(entity: EntityId, reason: impl Into<String>) -> Self {
        StepperError::Fault { entity, reason: reason.into() }
    }

    /// `true` for errors that end the session rather than one entity.
    pub fn is_session_fault(&self) -> bool {
        matches!(self, StepperError::Session(_))
    }
}

pub type StepperResult<T> = Result<T, StepperError>;
