use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Server-level settings. Every field has a default, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_chunk_seconds")]
    pub default_chunk_seconds: u32,
    #[serde(default = "default_true")]
    pub make_base64: bool,
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,
    /// Transcription is disabled when unset or blank.
    #[serde(default)]
    pub whisper_bin: Option<String>,
    #[serde(default)]
    pub whisper_args: Vec<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_chunk_seconds() -> u32 {
    300
}

fn default_true() -> bool {
    true
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_chunk_seconds: default_chunk_seconds(),
            make_base64: true,
            ffmpeg_bin: default_ffmpeg_bin(),
            whisper_bin: None,
            whisper_args: Vec::new(),
        }
    }
}

impl Config {
    pub fn jobs_dir(&self) -> PathBuf {
        self.data_dir.join("jobs")
    }

    /// Applies `FFMPEG_BIN`, `WHISPER_BIN` and `WHISPER_ARGS` from the
    /// environment. Unset or blank variables leave the current value alone.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(bin) = non_empty("FFMPEG_BIN") {
            self.ffmpeg_bin = bin.trim().to_string();
        }
        if let Some(bin) = non_empty("WHISPER_BIN") {
            self.whisper_bin = Some(bin.trim().to_string());
        }
        if let Some(args) = non_empty("WHISPER_ARGS") {
            self.whisper_args = args.split_whitespace().map(str::to_string).collect();
        }
    }
}
