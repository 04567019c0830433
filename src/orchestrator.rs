//! Transcode orchestrator
//!
//! Owns one job at a time and drives it through
//! `Idle → Loading → Staging → Running → ReadingOutput → Succeeded`.
//! Any engine or input error moves the job to `Failed` and performs a full
//! reset: the output is dropped and the elapsed time goes back to zero.
//! Only the generic status text is published; the cause goes to the log.

use tokio::sync::watch;

use crate::config::{JobConfig, OUTPUT_MEDIA_TYPE};
use crate::engine::MediaEngine;
use crate::error::{InputError, JobError};
use crate::job::{Job, JobSnapshot, JobStatus, OutputArtifact};
use crate::media::{InputSlots, MediaInput};
use crate::strategy::CombinationMode;
use crate::tracker::ElapsedTracker;

/// Job state machine around an injected engine
pub struct Orchestrator<E: MediaEngine> {
    engine: E,
    tracker: ElapsedTracker,
    inputs: InputSlots,
    mode: CombinationMode,
    output_name: String,
    job: Job,
    snapshots: watch::Sender<JobSnapshot>,
}

impl<E: MediaEngine> Orchestrator<E> {
    pub fn new(engine: E, config: &JobConfig) -> Self {
        let mode = CombinationMode::from_replace_flag(config.replace_audio);
        let (snapshots, _) = watch::channel(JobSnapshot::default());
        Self {
            engine,
            tracker: ElapsedTracker::new(config.tick_interval()),
            inputs: InputSlots::new(),
            mode,
            output_name: config.output_name.clone(),
            job: Job::new(mode),
            snapshots,
        }
    }

    /// Replace the video input
    pub fn select_video(&mut self, input: MediaInput) -> Result<(), InputError> {
        tracing::debug!("Video input: {} ({})", input.name(), input.preview());
        self.inputs.select_video(input)
    }

    /// Replace the audio input
    pub fn select_audio(&mut self, input: MediaInput) -> Result<(), InputError> {
        tracing::debug!("Audio input: {} ({})", input.name(), input.preview());
        self.inputs.select_audio(input)
    }

    /// Checkbox semantics: true replaces the soundtrack, false mixes
    pub fn set_replace_audio(&mut self, replace_audio: bool) {
        self.set_mode(CombinationMode::from_replace_flag(replace_audio));
    }

    /// Mode used by the next job
    pub fn set_mode(&mut self, mode: CombinationMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> CombinationMode {
        self.mode
    }

    pub fn status(&self) -> JobStatus {
        self.job.status()
    }

    /// Output of the last job, present only after success
    pub fn output(&self) -> Option<&OutputArtifact> {
        self.job.output()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.tracker.count()
    }

    /// Current state as seen by the presentation side
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot::of(&self.job, self.tracker.count())
    }

    /// Receive a snapshot on every status change
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.snapshots.subscribe()
    }

    /// Receive every elapsed-time tick
    pub fn subscribe_elapsed(&self) -> watch::Receiver<u64> {
        self.tracker.subscribe()
    }

    /// Discard the current job: output released, timer stopped at zero,
    /// status back to Idle.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.job = Job::new(self.mode);
        self.publish();
    }

    /// Run one job to completion or failure and return its final status.
    pub async fn run(&mut self) -> JobStatus {
        self.reset();
        self.job.mark_started();
        let job_id = self.job.id();
        tracing::info!(
            started_at = %self.job.started_at().map(|t| t.to_rfc3339()).unwrap_or_default(),
            "Job {} started ({} mode)",
            job_id,
            self.job.mode()
        );
        self.tracker.start();

        match self.pipeline().await {
            Ok(artifact) => {
                self.tracker.pause();
                tracing::info!(
                    "Job {} succeeded: {} bytes of {} in {}s",
                    job_id,
                    artifact.len(),
                    artifact.media_type(),
                    self.tracker.count()
                );
                self.job.succeed(artifact);
                self.publish();
            }
            Err(e) => {
                tracing::error!(
                    job = %job_id,
                    stage = ?self.job.status(),
                    "Job failed: {}",
                    e
                );
                self.tracker.reset();
                self.job.set_status(JobStatus::Failed);
                self.publish();
            }
        }

        self.job.status()
    }

    async fn pipeline(&mut self) -> Result<OutputArtifact, JobError> {
        self.enter(JobStatus::Loading);
        self.engine.load().await?;

        self.enter(JobStatus::Staging);
        let (video, audio) = self.inputs.pair(&self.output_name)?;
        let (video, audio) = (video.clone(), audio.clone());
        for input in [&video, &audio] {
            let data = input.read().await?;
            self.engine.stage(input.name(), data).await?;
        }

        self.enter(JobStatus::Running);
        let command = self
            .job
            .mode()
            .strategy()
            .build(video.name(), audio.name(), &self.output_name);
        tracing::debug!("Engine command: {}", command);
        self.engine.execute(&command).await?;

        self.enter(JobStatus::ReadingOutput);
        let data = self.engine.retrieve(&self.output_name).await?;
        Ok(OutputArtifact::new(
            self.job.id(),
            &self.output_name,
            OUTPUT_MEDIA_TYPE,
            data,
        ))
    }

    fn enter(&mut self, status: JobStatus) {
        tracing::debug!("Job {} → {:?}", self.job.id(), status);
        self.job.set_status(status);
        self.publish();
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}
