//! Per-job progress events fanned out over a broadcast channel.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::worker::job::JobStatus;

type EventSender = Arc<broadcast::Sender<JobProgressEvent>>;

/// Where a job is in its run. Finer grained than [`JobStatus`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Queued,
    Transcoding,
    ProcessingChunks,
    Completed,
    Failed,
}

impl JobPhase {
    /// Record status a subscriber should show while the job is in this phase.
    pub fn status(self) -> JobStatus {
        match self {
            JobPhase::Queued => JobStatus::Pending,
            JobPhase::Transcoding | JobPhase::ProcessingChunks => JobStatus::Processing,
            JobPhase::Completed => JobStatus::Completed,
            JobPhase::Failed => JobStatus::Failed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobPhase::Queued => "queued",
            JobPhase::Transcoding => "transcoding",
            JobPhase::ProcessingChunks => "processing chunks",
            JobPhase::Completed => "completed",
            JobPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressEvent {
    pub job_id: String,
    /// Upload name as shown to the user.
    pub filename: String,
    pub phase: JobPhase,
    pub status: JobStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Zero-based chunk being worked on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobProgressEvent {
    pub fn new(job_id: &str, filename: &str, phase: JobPhase, message: impl Into<String>) -> Self {
        Self {
            job_id: job_id.to_string(),
            filename: filename.to_string(),
            phase,
            status: phase.status(),
            message: message.into(),
            timestamp: Utc::now(),
            chunk_index: None,
            chunk_total: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Fan-out point for all jobs' progress. Cloning shares the channel.
#[derive(Clone)]
pub struct JobProgressBroadcaster {
    sender: EventSender,
}

impl JobProgressBroadcaster {
    /// `capacity` bounds how far a slow subscriber may lag before it starts
    /// missing events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.sender.subscribe()
    }

    /// Announces a job as queued and returns the tracker for its later events.
    pub fn start_job(&self, job_id: &str, filename: &str) -> JobProgressTracker {
        let tracker = JobProgressTracker::new(job_id, filename, Arc::clone(&self.sender));
        tracker.update_phase(JobPhase::Queued, "Waiting to start");
        tracker
    }
}

impl Default for JobProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Emits events for one job.
pub struct JobProgressTracker {
    job_id: String,
    filename: String,
    sender: EventSender,
}

impl JobProgressTracker {
    pub fn new(job_id: &str, filename: &str, sender: EventSender) -> Self {
        Self {
            job_id: job_id.to_string(),
            filename: filename.to_string(),
            sender,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    fn event(&self, phase: JobPhase, message: impl Into<String>) -> JobProgressEvent {
        JobProgressEvent::new(&self.job_id, &self.filename, phase, message)
    }

    fn emit(&self, event: JobProgressEvent) {
        // Err only means nobody is listening.
        let _ = self.sender.send(event);
    }

    pub fn update_phase(&self, phase: JobPhase, message: &str) {
        self.emit(self.event(phase, message));
    }

    pub fn chunk(&self, index: usize, total: usize) {
        let mut event = self.event(
            JobPhase::ProcessingChunks,
            format!("Chunk {}/{}", index + 1, total),
        );
        event.chunk_index = Some(index);
        event.chunk_total = Some(total);
        self.emit(event);
    }

    pub fn completed(&self, chunk_count: usize) {
        let noun = if chunk_count == 1 { "chunk" } else { "chunks" };
        self.emit(self.event(
            JobPhase::Completed,
            format!("Done, {} {}", chunk_count, noun),
        ));
    }

    pub fn failed(&self, error: &str) {
        let mut event = self.event(JobPhase::Failed, format!("Failed: {}", error));
        event.error = Some(error.to_string());
        self.emit(event);
    }
}
