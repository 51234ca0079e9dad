//! Core error types for slotplan-core.
//!
//! This module defines the error hierarchy using thiserror. Scheduling
//! outcomes that are not failures (a task that found no room) are not
//! errors; see [`crate::schedule::UnplacedReason`].

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Core error type for slotplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Scheduling run errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Calendar boundary errors raised by reader/writer implementations
    #[error("Calendar error: {0}")]
    Calendar(String),
}

/// Which kind of input an invalid interval came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalSource {
    Slot,
    Busy,
    Event,
}

impl std::fmt::Display for IntervalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slot => write!(f, "slot"),
            Self::Busy => write!(f, "busy interval"),
            Self::Event => write!(f, "calendar event"),
        }
    }
}

/// Errors that abort a scheduling run.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// A slot or busy interval whose start is not before its end
    #[error("Invalid {what} #{index}: end ({end}) must be greater than start ({start})")]
    InvalidInterval {
        what: IntervalSource,
        index: usize,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A task that cannot be scheduled as submitted
    #[error("Invalid task '{name}': {message}")]
    InvalidTask { name: String, message: String },

    /// A slot whose settings are out of range
    #[error("Invalid slot #{index}: {message}")]
    InvalidSlot { index: usize, message: String },

    /// Slots cannot be repeated as requested
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    /// Two tasks share a name
    #[error("Duplicate task name: {0}")]
    DuplicateTask(String),

    /// The assembled schedule broke one of its own guarantees
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl ScheduleError {
    /// True when the error signals an engine defect rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InternalInvariant(_))
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

    /// Key not present in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
