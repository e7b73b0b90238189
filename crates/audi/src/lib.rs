pub mod broadcast;
pub mod config;
pub mod display;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod storage;
pub mod worker;

pub use broadcast::{JobPhase, JobProgressBroadcaster, JobProgressEvent};
pub use config::{load_config, Config};
pub use error::{
    AudiError, ConfigError, CoordinatorError, Result, StoreError, TransitionError, WavError,
};
pub use pipeline::{Pipeline, PipelineConfig, PipelineContext, PipelineError, ProcessOptions};
pub use processor::wav_duration;
pub use storage::JobStore;
pub use worker::{Chunk, InFlightRegistry, Job, JobCoordinator, JobStatus, MemoryRegistry};
