//! Configuration file support
//!
//! Loads av-remix configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{EngineConfig, JobConfig, RemixConfig, OUTPUT_NAME};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Engine settings
    pub engine: Option<EngineSettings>,
    /// Job settings
    pub job: Option<JobSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    /// ffmpeg executable
    pub ffmpeg_path: Option<String>,
    /// Scratch directory root
    pub work_dir: Option<PathBuf>,
    /// ffmpeg -loglevel
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSettings {
    /// Name of the file produced by the engine
    pub output_name: Option<String>,
    /// Replace the soundtrack instead of mixing
    pub replace_audio: Option<bool>,
    /// Elapsed-time tick interval in milliseconds
    pub tick_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let engine = EngineConfig::default();
        Self {
            engine: Some(EngineSettings {
                ffmpeg_path: Some(engine.ffmpeg_path),
                work_dir: Some(engine.work_dir),
                log_level: Some(engine.log_level),
            }),
            job: Some(JobSettings {
                output_name: Some(OUTPUT_NAME.to_string()),
                replace_audio: Some(false),
                tick_interval_ms: Some(1000),
            }),
            logging: Some(LoggingSettings {
                level: Some("info".to_string()),
                format: Some("pretty".to_string()),
            }),
        }
    }

    /// Convert to RemixConfig
    pub fn into_remix_config(self) -> RemixConfig {
        let engine_defaults = EngineConfig::default();
        let job_defaults = JobConfig::default();
        let engine = self.engine.unwrap_or_default();
        let job = self.job.unwrap_or_default();
        let logging = self.logging.unwrap_or_default();

        RemixConfig {
            engine: EngineConfig {
                ffmpeg_path: engine.ffmpeg_path.unwrap_or(engine_defaults.ffmpeg_path),
                work_dir: engine.work_dir.unwrap_or(engine_defaults.work_dir),
                log_level: engine.log_level.unwrap_or(engine_defaults.log_level),
            },
            job: JobConfig {
                output_name: job.output_name.unwrap_or(job_defaults.output_name),
                replace_audio: job.replace_audio.unwrap_or(job_defaults.replace_audio),
                tick_interval_ms: job.tick_interval_ms.unwrap_or(job_defaults.tick_interval_ms),
            },
            log_level: logging.level.unwrap_or_else(|| "info".to_string()),
            log_format: logging.format.unwrap_or_else(|| "pretty".to_string()),
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}
