//! Core error types for tempoflow-core.
//!
//! This module defines the error hierarchy using thiserror. Playback
//! failures have their own type and are never converted into [`CoreError`]:
//! they are logged and dropped by the alarm notifier.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for tempoflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The routine cannot be run (no phases, or a phase without duration).
    #[error("Routine '{name}' cannot be started: {reason}")]
    InvalidRoutine { name: String, reason: String },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Routine store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The tick scheduler task is no longer running.
    #[error("Tick scheduler has shut down")]
    SchedulerClosed,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty routine name
    #[error("Routine name must not be empty")]
    EmptyName,

    /// Phase with zero duration
    #[error("Phase duration must be greater than zero")]
    ZeroDuration,

    /// Clock text that is not MM:SS or SS
    #[error("Invalid time '{input}': {message}")]
    InvalidClock { input: String, message: String },

    /// Unknown intensity tag
    #[error("Unknown intensity '{0}' (expected low, normal or high)")]
    UnknownIntensity(String),

    /// Phase position outside the routine
    #[error("No phase {position} (routine has {len})")]
    PhaseOutOfRange { position: usize, len: usize },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
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

    /// Unknown dot-separated key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// The data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Routine store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read or parse the routine file
    #[error("Failed to load routines from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to write the routine file
    #[error("Failed to save routines to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// No routine with this id
    #[error("Routine not found: {0}")]
    NotFound(String),
}

/// Audio playback errors. Recovered locally, never surfaced to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// Playback attempted before the first user interaction unlocked audio
    #[error("audio has not been unlocked by a user interaction yet")]
    Locked,

    /// The output device could not be opened or has gone away
    #[error("audio device unavailable: {0}")]
    Device(String),

    /// The cue could not be loaded or decoded
    #[error("alarm sound could not be decoded: {0}")]
    Decode(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
