use crate::config::Config;

/// Binaries the pipeline shells out to.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub ffmpeg_bin: String,
    /// `None` disables transcription regardless of what a job requests.
    pub whisper_bin: Option<String>,
    /// Extra arguments placed before the per-chunk whisper arguments.
    pub whisper_args: Vec<String>,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ffmpeg_bin: config.ffmpeg_bin.clone(),
            whisper_bin: config
                .whisper_bin
                .clone()
                .filter(|bin| !bin.trim().is_empty()),
            whisper_args: config.whisper_args.clone(),
        }
    }

    pub fn transcription_available(&self) -> bool {
        self.whisper_bin.is_some()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            whisper_bin: None,
            whisper_args: Vec::new(),
        }
    }
}

/// Per-job processing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    pub chunk_duration_seconds: u32,
    pub make_base64: bool,
    pub transcribe: bool,
}
