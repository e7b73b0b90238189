use std::path::PathBuf;

use crate::worker::job::Chunk;

use super::config::ProcessOptions;

/// Separator between captured command outputs in the job's processing log.
pub const LOG_DELIMITER: &str = "\n---\n";

pub struct PipelineContext {
    // Input
    pub job_dir: PathBuf,
    pub input_path: PathBuf,
    pub options: ProcessOptions,

    // Set by the discovery step, sorted by file name
    pub chunk_files: Vec<PathBuf>,

    // Chunks finished so far; kept on failure, cleared on cancellation
    pub chunks: Vec<Chunk>,

    // One entry per external invocation
    pub logs: Vec<String>,
}

impl PipelineContext {
    pub fn new(
        job_dir: impl Into<PathBuf>,
        input_path: impl Into<PathBuf>,
        options: ProcessOptions,
    ) -> Self {
        Self {
            job_dir: job_dir.into(),
            input_path: input_path.into(),
            options,
            chunk_files: Vec::new(),
            chunks: Vec::new(),
            logs: Vec::new(),
        }
    }

    pub fn chunks_dir(&self) -> PathBuf {
        self.job_dir.join("chunks")
    }

    pub fn base64_dir(&self) -> PathBuf {
        self.job_dir.join("base64")
    }

    pub fn transcripts_dir(&self) -> PathBuf {
        self.job_dir.join("transcripts")
    }

    pub fn combined_log(&self) -> String {
        self.logs.join(LOG_DELIMITER)
    }

    /// Combined log with a trailing error entry.
    pub fn combined_log_with_error(&self, error: &str) -> String {
        let mut entries = self.logs.clone();
        entries.push(error.to_string());
        entries.join(LOG_DELIMITER)
    }
}
