use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

/// Set of job IDs that currently have a background task running.
///
/// Every operation holds the lock only for the map access itself.
pub trait InFlightRegistry: Send + Sync {
    /// Returns false if the job was already registered.
    fn insert(&self, job_id: &str) -> bool;
    fn remove(&self, job_id: &str);
    fn contains(&self, job_id: &str) -> bool;
    /// In-flight job IDs with the time they were registered, oldest first.
    fn snapshot(&self) -> Vec<(String, DateTime<Utc>)>;
}

/// Process-local registry behind a single mutex.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    jobs: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        // The map stays consistent even if a holder panicked.
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl InFlightRegistry for MemoryRegistry {
    fn insert(&self, job_id: &str) -> bool {
        let mut jobs = self.lock();
        if jobs.contains_key(job_id) {
            return false;
        }
        jobs.insert(job_id.to_string(), Utc::now());
        true
    }

    fn remove(&self, job_id: &str) {
        self.lock().remove(job_id);
    }

    fn contains(&self, job_id: &str) -> bool {
        self.lock().contains_key(job_id)
    }

    fn snapshot(&self) -> Vec<(String, DateTime<Utc>)> {
        let mut entries: Vec<_> = self
            .lock()
            .iter()
            .map(|(id, started)| (id.clone(), *started))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }
}

/// Removes its job from the registry when dropped, including on panic.
pub struct InFlightGuard {
    registry: Arc<dyn InFlightRegistry>,
    job_id: String,
}

impl InFlightGuard {
    /// Registers `job_id`. Returns `None` if it is already in flight.
    pub fn acquire(registry: Arc<dyn InFlightRegistry>, job_id: &str) -> Option<Self> {
        if !registry.insert(job_id) {
            return None;
        }
        Some(Self {
            registry,
            job_id: job_id.to_string(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.job_id);
    }
}
