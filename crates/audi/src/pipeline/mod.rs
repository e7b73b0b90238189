pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod runner;

pub use command::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use config::{PipelineConfig, ProcessOptions};
pub use context::{PipelineContext, LOG_DELIMITER};
pub use error::PipelineError;
pub use progress::{BroadcastProgress, NoopProgress, ProgressEvent, ProgressReporter};
pub use runner::Pipeline;
