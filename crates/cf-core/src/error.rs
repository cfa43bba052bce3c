//! Core error type.
//!
//! Sub-crates define their own error enums and either convert `CoreError`
//! into one of their variants via `From` or wrap it directly.

use thiserror::Error;

/// Errors raised by `cf-core` parsing and validation helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid time of day {0:?}: expected HH:MM:SS within one day")]
    TimeOfDay(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `cf-core`.
pub type CoreResult<T> = Result<T, CoreError>;
