pub mod filesystem;

pub use filesystem::{JobStore, JOB_FILE_NAME, JOB_SUBDIRS};
