//! av-remix
//!
//! Combines a video file with a separate audio file by driving ffmpeg: the
//! audio either replaces the video's soundtrack or is mixed into it. A
//! single job moves through load, staging, transcode and output read-back
//! while an elapsed-time counter ticks beside it.

pub mod config;
pub mod config_file;
pub mod engine;
pub mod error;
pub mod job;
pub mod media;
pub mod orchestrator;
pub mod presenter;
pub mod strategy;
pub mod tracker;


pub use config::RemixConfig;
pub use engine::{EngineCommand, FfmpegEngine, MediaEngine};
pub use error::{EngineError, InputError, JobError, RemixError, Result};
pub use job::{JobSnapshot, JobStatus, OutputArtifact};
pub use media::{MediaInput, MediaKind};
pub use orchestrator::Orchestrator;
pub use strategy::CombinationMode;
pub use tracker::ElapsedTracker;
