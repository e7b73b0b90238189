pub mod coordinator;
pub mod job;
pub mod registry;

pub use coordinator::{JobCoordinator, PreparedJob};
pub use job::{new_job_id, Chunk, Job, JobStatus};
pub use registry::{InFlightGuard, InFlightRegistry, MemoryRegistry};
