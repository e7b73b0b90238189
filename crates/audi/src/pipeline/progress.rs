use crate::broadcast::job_progress::{JobPhase, JobProgressTracker};

/// Events emitted while a job moves through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Phase { phase: JobPhase, message: String },
    Chunk { index: usize, total: usize },
    Completed { chunk_count: usize },
    Failed { error: String },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests and callers without subscribers.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Bridges pipeline events onto the job progress broadcast channel.
pub struct BroadcastProgress {
    tracker: JobProgressTracker,
}

impl BroadcastProgress {
    pub fn from_tracker(tracker: JobProgressTracker) -> Self {
        Self { tracker }
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase { phase, message } => self.tracker.update_phase(phase, &message),
            ProgressEvent::Chunk { index, total } => self.tracker.chunk(index, total),
            ProgressEvent::Completed { chunk_count } => self.tracker.completed(chunk_count),
            ProgressEvent::Failed { error } => self.tracker.failed(&error),
        }
    }
}
