use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.default_chunk_seconds == 0 {
        return Err(ConfigError::Validation {
            message: "defaultChunkSeconds must be greater than zero".to_string(),
        });
    }

    if config.ffmpeg_bin.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "ffmpegBin must not be empty".to_string(),
        });
    }

    if config.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "dataDir must not be empty".to_string(),
        });
    }

    Ok(())
}
