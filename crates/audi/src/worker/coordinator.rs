use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::broadcast::job_progress::{JobProgressBroadcaster, JobProgressEvent};
use crate::config::Config;
use crate::error::{CoordinatorError, StoreError};
use crate::pipeline::progress::{BroadcastProgress, ProgressEvent, ProgressReporter};
use crate::pipeline::{Pipeline, PipelineConfig, PipelineContext, ProcessOptions};
use crate::sanitize;
use crate::storage::JobStore;
use crate::worker::job::{new_job_id, Job};
use crate::worker::registry::{InFlightGuard, InFlightRegistry, MemoryRegistry};

/// Attempts at claiming a fresh job directory before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// A persisted `pending` job whose upload is on disk, ready for [`JobCoordinator::submit`].
#[derive(Debug, Clone)]
pub struct PreparedJob {
    pub job: Job,
    pub job_dir: PathBuf,
    pub input_path: PathBuf,
}

/// Owns the lifecycle of jobs: ingestion, background processing, lookup
/// and deletion.
///
/// `submit` and `ingest` spawn onto the current Tokio runtime.
pub struct JobCoordinator {
    store: JobStore,
    pipeline: Arc<Pipeline>,
    registry: Arc<dyn InFlightRegistry>,
    progress: JobProgressBroadcaster,
    shutdown: CancellationToken,
    make_base64: bool,
}

impl JobCoordinator {
    pub fn new(store: JobStore, pipeline: Arc<Pipeline>) -> Self {
        Self::with_registry(store, pipeline, Arc::new(MemoryRegistry::new()))
    }

    pub fn with_registry(
        store: JobStore,
        pipeline: Arc<Pipeline>,
        registry: Arc<dyn InFlightRegistry>,
    ) -> Self {
        Self {
            store,
            pipeline,
            registry,
            progress: JobProgressBroadcaster::default(),
            shutdown: CancellationToken::new(),
            make_base64: true,
        }
    }

    /// Production coordinator running the configured binaries under
    /// `<dataDir>/jobs`.
    pub fn from_config(config: &Config) -> Self {
        let pipeline = Pipeline::from_config(Arc::new(PipelineConfig::from_config(config)));
        Self::new(JobStore::new(config.jobs_dir()), Arc::new(pipeline))
            .with_base64(config.make_base64)
    }

    /// Whether submitted jobs also get base64 dumps of their chunks.
    pub fn with_base64(mut self, make_base64: bool) -> Self {
        self.make_base64 = make_base64;
        self
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn transcription_available(&self) -> bool {
        self.pipeline.config().transcription_available()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.progress.subscribe()
    }

    pub fn is_in_flight(&self, job_id: &str) -> bool {
        self.registry.contains(job_id)
    }

    /// IDs of jobs with a running background task, oldest first.
    pub fn in_flight(&self) -> Vec<String> {
        self.registry
            .snapshot()
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }

    /// Options a job is processed with under this coordinator's settings.
    pub fn options_for(&self, job: &Job) -> ProcessOptions {
        ProcessOptions {
            chunk_duration_seconds: job.chunk_duration_seconds,
            make_base64: self.make_base64,
            transcribe: job.transcription_requested,
        }
    }

    /// Stores an upload under a new job directory and persists a `pending`
    /// record for it.
    pub async fn create_job<R>(
        &self,
        file_name: &str,
        mut upload: R,
        chunk_duration_seconds: u32,
        transcribe: bool,
    ) -> Result<PreparedJob, CoordinatorError>
    where
        R: AsyncRead + Unpin,
    {
        if chunk_duration_seconds == 0 {
            return Err(CoordinatorError::InvalidChunkDuration);
        }
        let name = sanitize::upload_file_name(file_name)
            .ok_or_else(|| CoordinatorError::InvalidFilename(file_name.to_string()))?;

        let (job_id, job_dir) = self.claim_job_dir().await?;
        self.store.ensure_job_subdirs(&job_dir).await?;

        let input_path = job_dir.join("original").join(&name);
        let mut file = tokio::fs::File::create(&input_path)
            .await
            .map_err(|e| io_error(&input_path, e))?;
        let bytes = tokio::io::copy(&mut upload, &mut file)
            .await
            .map_err(|e| io_error(&input_path, e))?;
        file.flush().await.map_err(|e| io_error(&input_path, e))?;
        file.sync_all().await.map_err(|e| io_error(&input_path, e))?;

        let job = Job::new(job_id, name, chunk_duration_seconds, transcribe);
        self.store.save(&job_dir, &job).await?;

        info!(
            "Created job {} for {} ({} bytes)",
            job.id, job.original_file_name, bytes
        );

        Ok(PreparedJob {
            job,
            job_dir,
            input_path,
        })
    }

    /// `create_job` followed by `submit`. Returns the pending record and the
    /// handle of the background task.
    pub async fn ingest<R>(
        &self,
        file_name: &str,
        upload: R,
        chunk_duration_seconds: u32,
        transcribe: bool,
    ) -> Result<(Job, JoinHandle<Job>), CoordinatorError>
    where
        R: AsyncRead + Unpin,
    {
        let prepared = self
            .create_job(file_name, upload, chunk_duration_seconds, transcribe)
            .await?;
        let options = self.options_for(&prepared.job);
        let job = prepared.job.clone();
        let handle = self.submit(prepared.job, prepared.job_dir, prepared.input_path, options)?;
        Ok((job, handle))
    }

    /// Registers the job as in flight and processes it on a background task.
    ///
    /// The job is registered before this returns, so a delete issued right
    /// after `submit` is refused. The task resolves to the final record.
    pub fn submit(
        &self,
        job: Job,
        job_dir: PathBuf,
        input_path: PathBuf,
        options: ProcessOptions,
    ) -> Result<JoinHandle<Job>, CoordinatorError> {
        let guard = InFlightGuard::acquire(Arc::clone(&self.registry), &job.id)
            .ok_or_else(|| CoordinatorError::Busy(job.id.clone()))?;

        let tracker = self.progress.start_job(&job.id, &job.original_file_name);
        let progress = BroadcastProgress::from_tracker(tracker);

        let task = JobTask {
            store: self.store.clone(),
            pipeline: Arc::clone(&self.pipeline),
            cancel: self.shutdown.child_token(),
            progress,
            guard,
        };

        debug!("Submitting job {}", job.id);
        Ok(tokio::spawn(task.run(job, job_dir, input_path, options)))
    }

    /// Absolute path of an artifact recorded on a job, e.g. a chunk's
    /// `audioFile`. `None` if the path would leave the job directory.
    pub fn asset_path(&self, job_id: &str, relative: &str) -> Option<PathBuf> {
        let job_dir = self.store.job_dir(job_id).ok()?;
        sanitize::resolve_asset_path(&job_dir, relative)
    }

    pub async fn load(&self, job_id: &str) -> Result<Job, StoreError> {
        self.store.load_by_id(job_id).await
    }

    pub async fn list(&self) -> Result<Vec<Job>, StoreError> {
        self.store.list().await
    }

    /// Removes a job directory. Refused while this coordinator is processing
    /// the job.
    pub async fn delete(&self, job_id: &str) -> Result<(), CoordinatorError> {
        self.remove_job(job_id, false).await
    }

    /// Like [`delete`](Self::delete), but also refuses jobs whose record is
    /// still `pending` or `processing`. Another process sharing the jobs
    /// root may be running them.
    pub async fn delete_settled(&self, job_id: &str) -> Result<(), CoordinatorError> {
        self.remove_job(job_id, true).await
    }

    async fn remove_job(
        &self,
        job_id: &str,
        require_settled: bool,
    ) -> Result<(), CoordinatorError> {
        let job_dir = self.store.job_dir(job_id)?;
        // Held until the directory is gone so a concurrent submit is refused.
        let _guard = InFlightGuard::acquire(Arc::clone(&self.registry), job_id)
            .ok_or_else(|| CoordinatorError::Busy(job_id.to_string()))?;

        if require_settled {
            match self.store.load(&job_dir).await {
                Ok(job) if !job.is_done() => {
                    return Err(CoordinatorError::Busy(job_id.to_string()));
                }
                Ok(_) | Err(StoreError::NotFound(_)) | Err(StoreError::Corrupt { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.store.remove(&job_dir).await?;
        info!("Deleted job {}", job_id);
        Ok(())
    }

    /// Cancels every running pipeline. Cancelled jobs end up `failed`.
    pub fn shutdown(&self) {
        info!("Cancelling in-flight jobs...");
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    async fn claim_job_dir(&self) -> Result<(String, PathBuf), CoordinatorError> {
        let root = self.store.jobs_root();
        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| io_error(root, e))?;

        for _ in 0..MAX_ID_ATTEMPTS {
            let job_id = new_job_id();
            let job_dir = self.store.job_dir(&job_id)?;
            match tokio::fs::create_dir(&job_dir).await {
                Ok(()) => return Ok((job_id, job_dir)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(io_error(&job_dir, e)),
            }
        }

        Err(io_error(
            root,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "could not allocate a unique job id",
            ),
        ))
    }
}

/// Everything one background job needs, moved onto its task.
struct JobTask {
    store: JobStore,
    pipeline: Arc<Pipeline>,
    cancel: CancellationToken,
    progress: BroadcastProgress,
    guard: InFlightGuard,
}

impl JobTask {
    async fn run(
        self,
        mut job: Job,
        job_dir: PathBuf,
        input_path: PathBuf,
        options: ProcessOptions,
    ) -> Job {
        let JobTask {
            store,
            pipeline,
            cancel,
            progress,
            guard,
        } = self;

        if let Err(e) = job.begin_processing() {
            warn!("job {}: not processing: {}", job.id, e);
            return job;
        }
        if !persist(&store, &job_dir, &job).await {
            let message = "job directory was removed".to_string();
            if let Err(e) = job.fail(Vec::new(), String::new(), message.clone(), Utc::now()) {
                error!("job {}: {}", job.id, e);
            }
            drop(guard);
            progress.report(ProgressEvent::Failed { error: message });
            return job;
        }

        let ctx = PipelineContext::new(&job_dir, input_path, options);
        let (result, ctx) = pipeline.run(ctx, &cancel, &progress).await;

        let finished_at = Utc::now();
        let outcome = match result {
            Ok(()) => {
                let log = ctx.combined_log();
                job.complete(ctx.chunks, log, finished_at)
                    .map(|()| ProgressEvent::Completed {
                        chunk_count: job.chunks.len(),
                    })
            }
            Err(e) => {
                let message = e.to_string();
                let log = ctx.combined_log_with_error(&message);
                job.fail(ctx.chunks, log, message.clone(), finished_at)
                    .map(|()| ProgressEvent::Failed { error: message })
            }
        };

        let event = match outcome {
            Ok(event) => event,
            Err(e) => {
                error!("job {}: {}", job.id, e);
                return job;
            }
        };

        persist(&store, &job_dir, &job).await;

        match &job.error_message {
            None => info!("job {}: completed with {} chunks", job.id, job.chunks.len()),
            Some(message) => warn!("job {}: failed: {}", job.id, message),
        }

        // Subscribers reacting to the terminal event must see the job as idle.
        drop(guard);
        progress.report(event);
        job
    }
}

/// Writes a status change. Failures are logged and the in-memory record
/// stands. Returns false if the job directory no longer exists.
async fn persist(store: &JobStore, job_dir: &Path, job: &Job) -> bool {
    match store.update(job_dir, job).await {
        Ok(()) => true,
        Err(StoreError::NotFound(_)) => {
            warn!(
                "job {}: directory was removed, status {} not written",
                job.id, job.status
            );
            false
        }
        Err(e) => {
            error!("job {}: failed to update status: {}", job.id, e);
            true
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CoordinatorError {
    CoordinatorError::Io {
        path: path.to_path_buf(),
        source,
    }
}
