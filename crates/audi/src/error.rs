use std::path::PathBuf;
use thiserror::Error;

use crate::worker::job::JobStatus;

#[derive(Error, Debug)]
pub enum AudiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("WAV inspection error: {0}")]
    Wav(#[from] WavError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("Coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    #[error("Invalid state transition: {0}")]
    Transition(#[from] TransitionError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Errors from walking a RIFF/WAVE header.
#[derive(Error, Debug)]
pub enum WavError {
    #[error("Malformed WAV data: {0}")]
    Format(String),

    #[error("Failed to read WAV data: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Job record not found at '{0}'")]
    NotFound(PathBuf),

    #[error("Job record at '{path}' is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize job record: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid job id: '{0}'")]
    InvalidJobId(String),
}

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Job {0} is still processing")]
    Busy(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Chunk duration must be greater than zero")]
    InvalidChunkDuration,

    #[error("Invalid upload filename: '{0}'")]
    InvalidFilename(String),
}

/// Rejected job lifecycle transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot move job from {from} to {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

pub type Result<T> = std::result::Result<T, AudiError>;
