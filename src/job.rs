//! Job state
//!
//! This module defines:
//! - `JobStatus`, the states a transcoding attempt moves through
//! - `Job`, the single active attempt
//! - `OutputArtifact`, the result of a successful job
//! - `JobSnapshot`, what is published to the presentation side

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use uuid::Uuid;

use crate::strategy::CombinationMode;

/// Job lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Idle,
    Loading,
    Staging,
    Running,
    ReadingOutput,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Status text shown to the user
    pub fn message(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Loading => "Loading ffmpeg-core.js",
            Self::Staging => "Loading input files to memory",
            Self::Running => "Transcoding",
            Self::ReadingOutput => "Complete transcoding",
            Self::Succeeded => "Success. Output is ready",
            Self::Failed => "Error happened",
        }
    }

    /// Succeeded or Failed
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// A job is between trigger and completion
    pub fn is_in_flight(self) -> bool {
        !self.is_terminal() && self != Self::Idle
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of a successful job
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    data: Bytes,
    media_type: &'static str,
    reference: String,
}

impl OutputArtifact {
    pub fn new(job_id: Uuid, name: &str, media_type: &'static str, data: Bytes) -> Self {
        Self {
            data,
            media_type,
            reference: format!("memory://{}/{}", job_id, name),
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    /// Addressable reference for playback
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write the artifact bytes to disk
    pub async fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        tokio::fs::write(path, &self.data).await
    }
}

/// The current transcoding attempt
#[derive(Debug)]
pub struct Job {
    id: Uuid,
    mode: CombinationMode,
    status: JobStatus,
    started_at: Option<DateTime<Utc>>,
    output: Option<OutputArtifact>,
}

impl Job {
    /// A fresh job in the Idle state
    pub fn new(mode: CombinationMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            status: JobStatus::Idle,
            started_at: None,
            output: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> CombinationMode {
        self.mode
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Present only while the job is Succeeded
    pub fn output(&self) -> Option<&OutputArtifact> {
        self.output.as_ref()
    }

    pub(crate) fn mark_started(&mut self) {
        self.started_at = Some(Utc::now());
    }

    /// Move to a non-success state; the artifact never outlives Succeeded
    pub(crate) fn set_status(&mut self, status: JobStatus) {
        debug_assert!(status != JobStatus::Succeeded, "use succeed()");
        self.status = status;
        self.output = None;
    }

    pub(crate) fn succeed(&mut self, artifact: OutputArtifact) {
        self.status = JobStatus::Succeeded;
        self.output = Some(artifact);
    }
}

/// Published view of the job for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub message: String,
    pub elapsed_secs: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub output: Option<String>,
}

impl JobSnapshot {
    pub fn of(job: &Job, elapsed_secs: u64) -> Self {
        Self {
            status: job.status(),
            message: job.status().message().to_string(),
            elapsed_secs,
            started_at: job.started_at(),
            output: job.output().map(|o| o.reference().to_string()),
        }
    }
}

impl Default for JobSnapshot {
    fn default() -> Self {
        Self {
            status: JobStatus::Idle,
            message: JobStatus::Idle.message().to_string(),
            elapsed_secs: 0,
            started_at: None,
            output: None,
        }
    }
}
