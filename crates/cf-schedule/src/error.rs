use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The backing store could not be reached or opened.  Fatal to a run:
    /// simulating zero pedestrians silently would corrupt a campaign.
    #[error("schedule data unavailable: {0}")]
    DataUnavailable(String),

    #[error("schedule parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
