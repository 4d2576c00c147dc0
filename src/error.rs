use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Incorrect major version: {0}")]
    IncorrectMajor(String),

    #[error("Incorrect minor version: {0}")]
    IncorrectMinor(String),

    #[error("Incorrect patch version: {0}")]
    IncorrectPatch(String),

    #[error("Incorrect snapshot year: {0}")]
    IncorrectYear(String),

    #[error("Incorrect snapshot week: {0}")]
    IncorrectWeek(String),

    #[error("Incorrect snapshot build: {0}")]
    IncorrectBuild(String),

    #[error("Missing major version")]
    MissingMajor,

    #[error("Missing minor version")]
    MissingMinor,

    #[error("Invalid snapshot format")]
    InvalidSnapshotFormat,

    #[error("Too many components")]
    ExtraComponents,
}

/// A violated [`LaunchConfig`](crate::config::LaunchConfig) constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("java path must not be empty")]
    EmptyJavaPath,

    #[error("game version must not be empty")]
    EmptyVersion,

    #[error("username must not be empty")]
    EmptyUsername,

    #[error("memory allocation must be positive")]
    ZeroMemory,

    #[error("memory allocation {value}MB is outside {min}..={max}MB")]
    MemoryOutOfRange { value: u32, min: u32, max: u32 },

    #[error("invalid account uuid: {0}")]
    InvalidUuid(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to write settings file: {0}")]
    Write(#[source] std::io::Error),

    #[error("Malformed settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Memory bounds are inverted: min {min}MB > max {max}MB")]
    InvertedMemoryBounds { min: u32, max: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("invalid launch config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Minecraft is already running")]
    AlreadyRunning,

    #[error("Minecraft is not running")]
    NotRunning,

    #[error("failed to start Minecraft: {0}")]
    SpawnFailed(String),

    #[error("Minecraft did not exit in time and was marked stopped")]
    StopTimeout,

    #[error("lost track of the Minecraft process: {0}")]
    ProcessWatchFailure(String),

    #[error("launch was cancelled by a stop request")]
    Cancelled,

    #[error("failed to persist launch config: {0}")]
    Persistence(String),
}

/// Stable discriminant of a [`LaunchError`], shared with the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchErrorKind {
    InvalidConfig,
    AlreadyRunning,
    NotRunning,
    SpawnFailed,
    StopTimeout,
    ProcessWatchFailure,
    Cancelled,
    Persistence,
    UnknownCommand,
    InvalidArguments,
    Encoding,
}

impl LaunchError {
    pub fn kind(&self) -> LaunchErrorKind {
        match self {
            LaunchError::InvalidConfig(_) => LaunchErrorKind::InvalidConfig,
            LaunchError::AlreadyRunning => LaunchErrorKind::AlreadyRunning,
            LaunchError::NotRunning => LaunchErrorKind::NotRunning,
            LaunchError::SpawnFailed(_) => LaunchErrorKind::SpawnFailed,
            LaunchError::StopTimeout => LaunchErrorKind::StopTimeout,
            LaunchError::ProcessWatchFailure(_) => LaunchErrorKind::ProcessWatchFailure,
            LaunchError::Cancelled => LaunchErrorKind::Cancelled,
            LaunchError::Persistence(_) => LaunchErrorKind::Persistence,
        }
    }
}
