//! Structured logging setup.
//!
//! The compositor embedding this crate usually installs its own subscriber.
//! [`init`] is for hosts that do not: it installs a `tracing_subscriber`
//! formatter whose filter comes from `RUST_LOG`, falling back to the level
//! in the config file.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Builds the filter: `RUST_LOG` wins, otherwise `default_level`.
///
/// # Errors
///
/// Returns [`LoggingError::InvalidFilter`] if `default_level` is needed and
/// does not parse.
pub fn build_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_level).map_err(|e| LoggingError::InvalidFilter {
        filter: default_level.to_string(),
        reason: e.to_string(),
    })
}

/// Installs the global formatter subscriber.
///
/// # Errors
///
/// Returns [`LoggingError::InvalidFilter`] for a bad level and
/// [`LoggingError::AlreadyInstalled`] if a subscriber is already set.
pub fn init(default_level: &str) -> Result<(), LoggingError> {
    let filter = build_filter(default_level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)
}
