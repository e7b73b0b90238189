use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// Lifecycle stage of a processing job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        match self {
            JobStatus::Pending | JobStatus::Processing => false,
            JobStatus::Completed | JobStatus::Failed => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audio slice derived from the upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub index: usize,
    /// `index * chunk_duration_seconds`, not measured.
    pub start_seconds: f64,
    /// Measured from the segment's WAV header.
    pub duration_seconds: f64,
    /// Relative to the job directory, forward slashes.
    pub audio_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_file: Option<String>,
    /// First characters of the transcript, or the reason transcription failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_preview: Option<String>,
}

/// Everything the dashboard needs to render a processing run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub original_file_name: String,
    pub original_video_path: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub chunk_duration_seconds: u32,
    pub transcription_requested: bool,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub chunks: Vec<Chunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_log: Option<String>,
}

impl Job {
    /// Creates a `pending` job for a file stored at `original/<file name>`.
    pub fn new(
        id: impl Into<String>,
        original_file_name: impl Into<String>,
        chunk_duration_seconds: u32,
        transcription_requested: bool,
    ) -> Self {
        let original_file_name = original_file_name.into();
        Self {
            id: id.into(),
            original_video_path: format!("original/{}", original_file_name),
            original_file_name,
            created_at: Utc::now(),
            completed_at: None,
            chunk_duration_seconds,
            transcription_requested,
            status: JobStatus::Pending,
            error_message: None,
            chunks: Vec::new(),
            processing_log: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }

    /// `pending -> processing`. Clears leftovers from any earlier attempt.
    pub fn begin_processing(&mut self) -> Result<(), TransitionError> {
        self.transition(JobStatus::Processing)?;
        self.error_message = None;
        self.processing_log = None;
        Ok(())
    }

    /// `processing -> completed`.
    pub fn complete(
        &mut self,
        chunks: Vec<Chunk>,
        processing_log: String,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition(JobStatus::Completed)?;
        self.chunks = chunks;
        self.error_message = None;
        self.processing_log = Some(processing_log).filter(|log| !log.is_empty());
        self.completed_at = Some(at);
        Ok(())
    }

    /// `processing -> failed`. Partial chunks are kept so the dashboard can
    /// show what succeeded before the failure.
    pub fn fail(
        &mut self,
        chunks: Vec<Chunk>,
        processing_log: String,
        error: String,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition(JobStatus::Failed)?;
        self.chunks = chunks;
        self.error_message = Some(error);
        self.processing_log = Some(processing_log).filter(|log| !log.is_empty());
        self.completed_at = Some(at);
        Ok(())
    }

    fn transition(&mut self, to: JobStatus) -> Result<(), TransitionError> {
        let allowed = match (self.status, to) {
            (JobStatus::Pending, JobStatus::Processing) => true,
            (JobStatus::Processing, JobStatus::Completed) => true,
            (JobStatus::Processing, JobStatus::Failed) => true,
            (JobStatus::Pending, _)
            | (JobStatus::Processing, _)
            | (JobStatus::Completed, _)
            | (JobStatus::Failed, _) => false,
        };

        if !allowed {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }

        self.status = to;
        Ok(())
    }
}

/// Generates a `YYYYMMDD-HHMMSS-NNNN` identifier that keeps jobs roughly ordered.
pub fn new_job_id() -> String {
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    let suffix = uuid::Uuid::new_v4().as_u128() % 10_000;
    format!("{}-{:04}", timestamp, suffix)
}
