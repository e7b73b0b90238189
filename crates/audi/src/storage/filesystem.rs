use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::worker::job::Job;

pub const JOB_FILE_NAME: &str = "job.json";
const JOB_TEMP_FILE_NAME: &str = "job.json.tmp";

/// Per-job subdirectories created at upload time.
pub const JOB_SUBDIRS: [&str; 4] = ["original", "chunks", "base64", "transcripts"];

/// Durable job records, one directory per job under a jobs root.
#[derive(Debug, Clone)]
pub struct JobStore {
    jobs_root: PathBuf,
}

impl JobStore {
    pub fn new<P: AsRef<Path>>(jobs_root: P) -> Self {
        Self {
            jobs_root: jobs_root.as_ref().to_path_buf(),
        }
    }

    pub fn jobs_root(&self) -> &Path {
        &self.jobs_root
    }

    /// Resolves the directory for `job_id`, rejecting ids that would escape
    /// the jobs root.
    pub fn job_dir(&self, job_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !job_id.is_empty()
            && job_id != "."
            && job_id != ".."
            && !job_id.contains(|c: char| c == '/' || c == '\\');
        if !valid {
            return Err(StoreError::InvalidJobId(job_id.to_string()));
        }
        Ok(self.jobs_root.join(job_id))
    }

    /// Makes sure the expected per-job subdirectories exist.
    pub async fn ensure_job_subdirs(&self, job_dir: &Path) -> Result<(), StoreError> {
        for name in JOB_SUBDIRS {
            let dir = job_dir.join(name);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| StoreError::Io { path: dir, source: e })?;
        }
        Ok(())
    }

    /// Serializes the job into `job.json` via a temp file and rename, so a
    /// reader sees either the previous record or the new one.
    pub async fn save(&self, job_dir: &Path, job: &Job) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(job_dir)
            .await
            .map_err(|e| StoreError::Io {
                path: job_dir.to_path_buf(),
                source: e,
            })?;
        self.write_record(job_dir, job).await
    }

    /// Like [`save`](Self::save), but never recreates a job directory that
    /// has been removed. Returns `NotFound` for a missing directory.
    pub async fn update(&self, job_dir: &Path, job: &Job) -> Result<(), StoreError> {
        match tokio::fs::metadata(job_dir).await {
            Ok(meta) if meta.is_dir() => self.write_record(job_dir, job).await,
            Ok(_) => Err(StoreError::NotFound(job_dir.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(job_dir.to_path_buf()))
            }
            Err(e) => Err(StoreError::Io {
                path: job_dir.to_path_buf(),
                source: e,
            }),
        }
    }

    async fn write_record(&self, job_dir: &Path, job: &Job) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(job).map_err(StoreError::Serialize)?;

        let tmp = job_dir.join(JOB_TEMP_FILE_NAME);
        tokio::fs::write(&tmp, &data)
            .await
            .map_err(|e| StoreError::Io {
                path: tmp.clone(),
                source: e,
            })?;

        let target = job_dir.join(JOB_FILE_NAME);
        tokio::fs::rename(&tmp, &target)
            .await
            .map_err(|e| StoreError::Io {
                path: target,
                source: e,
            })?;

        Ok(())
    }

    pub async fn load(&self, job_dir: &Path) -> Result<Job, StoreError> {
        let path = job_dir.join(JOB_FILE_NAME);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path));
            }
            Err(e) => return Err(StoreError::Io { path, source: e }),
        };

        serde_json::from_slice(&data).map_err(|e| StoreError::Corrupt { path, source: e })
    }

    pub async fn load_by_id(&self, job_id: &str) -> Result<Job, StoreError> {
        let job_dir = self.job_dir(job_id)?;
        self.load(&job_dir).await
    }

    /// Loads every job under the root, newest first. Directories without a
    /// readable record are skipped; a missing root yields an empty list.
    pub async fn list(&self) -> Result<Vec<Job>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.jobs_root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.jobs_root.clone(),
                    source: e,
                })
            }
        };

        let mut jobs = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(StoreError::Io {
                        path: self.jobs_root.clone(),
                        source: e,
                    })
                }
            };

            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }

            match self.load(&entry.path()).await {
                Ok(job) => jobs.push(job),
                Err(e) => log::debug!("Skipping {}: {}", entry.path().display(), e),
            }
        }

        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    /// Removes a job directory and everything in it. Missing directories are
    /// not an error.
    pub async fn remove(&self, job_dir: &Path) -> Result<(), StoreError> {
        match tokio::fs::remove_dir_all(job_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io {
                path: job_dir.to_path_buf(),
                source: e,
            }),
        }
    }
}
