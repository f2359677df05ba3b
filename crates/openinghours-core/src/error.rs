//! Core error types for openinghours-core.
//!
//! Every failure of one `(service, year)` import is an [`ImportError`]. An
//! empty feed is not an error; see [`crate::pipeline::YearOutcome::Skipped`].

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Boxed error returned by external collaborators (feed source, rule sink).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Core error type for openinghours-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Import failures for a single service year
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Custom error with message
    #[error("{0}")]
    Custom(String),
}

impl From<BoxError> for CoreError {
    fn from(err: BoxError) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Failure of one `(service, year)` import run.
///
/// Nothing is handed to the rule sink for a year that fails with any of
/// these.
#[derive(Error, Debug)]
pub enum ImportError {
    /// A timestamp or date in the feed could not be parsed.
    #[error("Malformed feed value for '{field}' ({value:?}): {reason}")]
    FeedFormat {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// A required field is structurally missing.
    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },

    /// Intervals reached the accumulator out of date order.
    #[error("Interval dated {next} arrived after {previous}")]
    OrderingViolation { previous: NaiveDate, next: NaiveDate },

    /// The feed-fetch collaborator failed.
    #[error("Feed request failed for '{service}': {source}")]
    Feed {
        service: String,
        #[source]
        source: BoxError,
    },

    /// The persistence collaborator rejected the batch.
    #[error("Storing rules for '{service}' ({year}) failed: {source}")]
    Sink {
        service: String,
        year: i32,
        #[source]
        source: BoxError,
    },
}

impl ImportError {
    pub(crate) fn feed_format(
        field: &'static str,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        ImportError::FeedFormat {
            field,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// A recurrence expression that is neither of the two accepted forms.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unsupported recurrence expression {expression:?}: {reason}")]
pub struct RecurrenceParseError {
    pub expression: String,
    pub reason: String,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
