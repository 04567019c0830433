//! Runtime configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Fixed name of the file the engine writes
pub const OUTPUT_NAME: &str = "output.mp4";

/// Media type attached to the output artifact
pub const OUTPUT_MEDIA_TYPE: &str = "video/mp4";

/// Engine adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// ffmpeg executable (name on PATH or absolute path)
    pub ffmpeg_path: String,

    /// Directory under which per-job scratch directories are created
    pub work_dir: PathBuf,

    /// Value passed to ffmpeg's -loglevel
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            work_dir: std::env::temp_dir(),
            log_level: "info".to_string(),
        }
    }
}

/// Job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Name of the file read back from the engine
    pub output_name: String,

    /// Replace the video's soundtrack instead of mixing
    pub replace_audio: bool,

    /// Elapsed-time tick interval in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            output_name: OUTPUT_NAME.to_string(),
            replace_audio: false,
            tick_interval_ms: 1000,
        }
    }
}

impl JobConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemixConfig {
    /// Engine configuration
    pub engine: EngineConfig,

    /// Job configuration
    pub job: JobConfig,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,
}

impl RemixConfig {
    /// Defaults with logging filled in
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            ..Default::default()
        }
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
