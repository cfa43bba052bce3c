use cf_core::CoreError;
use cf_mobility::StepperError;
use cf_schedule::ScheduleError;
use thiserror::Error;

/// Errors that end a run or the whole campaign.
///
/// Entity-scoped faults (an unlocatable building, a rejected injection, a
/// failed `set_route`) never surface here: they are logged and absorbed.
#[derive(Debug, Error)]
pub enum SimError {
    /// The schedule store could not be reached.  Fatal to the run.
    #[error("schedule data unavailable: {0}")]
    DataUnavailable(String),

    /// The stepper session is gone.  Fatal to the campaign.
    #[error("stepper session fault: {0}")]
    SessionFault(String),

    #[error("campaign configuration error: {0}")]
    Config(String),

    /// Any other schedule failure (malformed rows, I/O).
    #[error("schedule error: {0}")]
    Schedule(#[source] ScheduleError),
}

impl SimError {
    /// `true` when no further run of the campaign can succeed.
    pub fn is_fatal_to_campaign(&self) -> bool {
        matches!(self, SimError::SessionFault(_))
    }
}

impl From<ScheduleError> for SimError {
    fn from(e: ScheduleError) -> Self {
        match e {
            ScheduleError::DataUnavailable(msg) => SimError::DataUnavailable(msg),
            other => SimError::Schedule(other),
        }
    }
}

/// Only session-level stepper calls (`open`, `advance`, `close`) convert
/// with `?`; entity faults are handled where they occur.
impl From<StepperError> for SimError {
    fn from(e: StepperError) -> Self {
        SimError::SessionFault(e.to_string())
    }
}

impl From<CoreError> for SimError {
    fn from(e: CoreError) -> Self {
        SimError::Config(e.to_string())
    }
}

pub type SimResult<T> = Result<T, SimError>;
