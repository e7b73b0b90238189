use std::path::PathBuf;

use thiserror::Error;

use crate::error::WavError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{program} binary not found")]
    Dependency { program: String },

    #[error("{context} '{path}': {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("running {program}: {status}")]
    CommandFailed { program: String, status: String },

    #[error("locating chunks: {0}")]
    Glob(String),

    #[error("no audio chunks produced")]
    NoOutput,

    #[error("determining chunk duration for '{path}': {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: WavError,
    },

    #[error("creating base64 dump '{path}': {source}")]
    Base64 {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("processing cancelled")]
    Cancelled,
}

impl PipelineError {
    pub(crate) fn io(
        context: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }
}
