//! In-process stand-in for the ffmpeg engine
//!
//! Interprets the subset of ffmpeg arguments the strategies emit (`-i`,
//! `-map`, `-filter_complex`, `-ac`, `-shortest`) against `TestMedia`
//! fixtures, records every call together with the snapshot the orchestrator
//! had published at that moment, and can be told to fail at any step.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::fixtures::{FakeOutput, TestMedia};
use crate::engine::{EngineCommand, MediaEngine};
use crate::error::EngineError;
use crate::job::JobSnapshot;

/// Engine operation as observed by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Load,
    Stage(String),
    Execute,
    Retrieve(String),
}

/// Step at which the fake reports an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Load,
    /// First `stage` of a job
    StageVideo,
    /// Second `stage` of a job
    StageAudio,
    Execute,
    Retrieve,
    /// `execute` succeeds but writes nothing
    NoOutput,
}

#[derive(Default)]
struct FakeState {
    fail_at: Option<FailAt>,
    latency: Option<Duration>,
    loaded: bool,
    staged_this_job: usize,
    files: HashMap<String, Bytes>,
    calls: Vec<(Call, JobSnapshot)>,
    commands: Vec<EngineCommand>,
    snapshots: Option<watch::Receiver<JobSnapshot>>,
    elapsed: Option<watch::Receiver<u64>>,
}

/// Cloneable handle; clones share state so a test can inspect the engine
/// after moving one clone into an orchestrator.
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(self, fail_at: FailAt) -> Self {
        self.state.lock().fail_at = Some(fail_at);
        self
    }

    /// Make every operation take `latency` of (tokio) time
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().latency = Some(latency);
        self
    }

    /// Change latency between jobs; `None` makes calls immediate
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().latency = latency;
    }

    /// Record the orchestrator's published state on every call
    pub fn observe(
        &self,
        snapshots: watch::Receiver<JobSnapshot>,
        elapsed: watch::Receiver<u64>,
    ) {
        let mut state = self.state.lock();
        state.snapshots = Some(snapshots);
        state.elapsed = Some(elapsed);
    }

    /// Calls so far, each with the snapshot seen when it was made
    pub fn calls(&self) -> Vec<(Call, JobSnapshot)> {
        self.state.lock().calls.clone()
    }

    pub fn executed(&self) -> bool {
        self.state
            .lock()
            .calls
            .iter()
            .any(|(c, _)| *c == Call::Execute)
    }

    pub fn retrieved(&self) -> bool {
        self.state
            .lock()
            .calls
            .iter()
            .any(|(c, _)| matches!(c, Call::Retrieve(_)))
    }

    pub fn last_command(&self) -> Option<EngineCommand> {
        self.state.lock().commands.last().cloned()
    }

    async fn enter(&self, call: Call) -> Option<FailAt> {
        let latency = self.state.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock();
        let mut seen = state
            .snapshots
            .as_ref()
            .map(|rx| rx.borrow().clone())
            .unwrap_or_default();
        if let Some(elapsed) = state.elapsed.as_ref() {
            seen.elapsed_secs = *elapsed.borrow();
        }
        state.calls.push((call, seen));
        state.fail_at
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    async fn load(&mut self) -> Result<(), EngineError> {
        let fail_at = self.enter(Call::Load).await;
        let mut state = self.state.lock();
        state.loaded = false;
        state.files.clear();
        state.staged_this_job = 0;
        if fail_at == Some(FailAt::Load) {
            return Err(EngineError::Load("failed to fetch engine core".into()));
        }
        state.loaded = true;
        Ok(())
    }

    async fn stage(&mut self, name: &str, data: Bytes) -> Result<(), EngineError> {
        let fail_at = self.enter(Call::Stage(name.to_string())).await;
        let mut state = self.state.lock();
        if !state.loaded {
            return Err(EngineError::staging(name, "engine not loaded"));
        }
        state.staged_this_job += 1;
        let failing = match state.staged_this_job {
            1 => fail_at == Some(FailAt::StageVideo),
            2 => fail_at == Some(FailAt::StageAudio),
            _ => false,
        };
        if failing {
            return Err(EngineError::staging(name, "out of memory"));
        }
        state.files.insert(name.to_string(), data);
        Ok(())
    }

    async fn execute(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        let fail_at = self.enter(Call::Execute).await;
        let mut state = self.state.lock();
        state.commands.push(command.clone());
        if !state.loaded {
            return Err(EngineError::execution(None, "engine not loaded"));
        }
        if fail_at == Some(FailAt::Execute) {
            return Err(EngineError::execution(Some(1), "Conversion failed!"));
        }

        let (name, output) = interpret(command.as_slice(), &state.files)?;
        if fail_at != Some(FailAt::NoOutput) {
            let data = serde_json::to_vec(&output)
                .map_err(|e| EngineError::execution(Some(1), e.to_string()))?;
            state.files.insert(name, Bytes::from(data));
        }
        Ok(())
    }

    async fn retrieve(&mut self, name: &str) -> Result<Bytes, EngineError> {
        let fail_at = self.enter(Call::Retrieve(name.to_string())).await;
        let state = self.state.lock();
        if fail_at == Some(FailAt::Retrieve) {
            return Err(EngineError::retrieval(name, "read error"));
        }
        state
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::retrieval(name, "no such file"))
    }
}

fn fail(message: impl Into<String>) -> EngineError {
    EngineError::execution(Some(1), message)
}

/// Evaluate a command against the staged files, returning the output name
/// and what would have been written there.
fn interpret(
    args: &[String],
    files: &HashMap<String, Bytes>,
) -> Result<(String, FakeOutput), EngineError> {
    let mut inputs: Vec<TestMedia> = Vec::new();
    let mut maps: Vec<&str> = Vec::new();
    let mut filter: Option<&str> = None;
    let mut channels: Option<u32> = None;
    let mut shortest = false;

    let (output, options) = args
        .split_last()
        .ok_or_else(|| fail("At least one output file must be specified"))?;

    let mut iter = options.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-i" => {
                let name = iter.next().ok_or_else(|| fail("-i needs a value"))?;
                let data = files
                    .get(name)
                    .ok_or_else(|| fail(format!("{}: No such file or directory", name)))?;
                let media = TestMedia::from_bytes(data).ok_or_else(|| {
                    fail(format!("{}: Invalid data found when processing input", name))
                })?;
                inputs.push(media);
            }
            "-map" => maps.push(iter.next().ok_or_else(|| fail("-map needs a value"))?.as_str()),
            "-filter_complex" => {
                let graph = iter.next().ok_or_else(|| fail("-filter_complex needs a value"))?;
                filter = Some(graph.as_str());
            }
            "-ac" => {
                let value = iter.next().ok_or_else(|| fail("-ac needs a value"))?;
                channels = Some(value.parse().map_err(|_| fail("bad -ac value"))?);
            }
            "-c" | "-c:v" | "-c:a" => {
                iter.next();
            }
            "-shortest" => shortest = true,
            other => return Err(fail(format!("Unrecognized option '{}'", other))),
        }
    }

    let mut merged_label: Option<&str> = None;
    if let Some(graph) = filter {
        if graph != "[0:a][1:a]amerge=inputs=2[a]" {
            return Err(fail(format!("Unsupported filter graph {}", graph)));
        }
        for spec in ["0:a", "1:a"] {
            if !pick(&inputs, spec)?.has_audio {
                return Err(fail(format!(
                    "Stream specifier '{}' in filtergraph description matches no streams.",
                    spec
                )));
            }
        }
        merged_label = Some("[a]");
    }

    let mut video_from = None;
    let mut audio_from = Vec::new();
    for spec in maps {
        if Some(spec) == merged_label {
            audio_from.extend(inputs.iter().take(2).map(|m| m.name.clone()));
            continue;
        }
        let media = pick(&inputs, spec)?;
        let found = match spec.split(':').nth(1) {
            Some("v") => media.has_video,
            Some("a") => media.has_audio,
            _ => false,
        };
        if !found {
            return Err(fail(format!("Stream map '{}' matches no streams.", spec)));
        }
        if spec.ends_with(":v") {
            video_from = Some(media.name.clone());
        } else {
            audio_from.push(media.name.clone());
        }
    }

    let durations = inputs.iter().map(|m| m.duration_secs);
    let duration_secs = if shortest {
        durations.fold(f64::INFINITY, f64::min)
    } else {
        durations.fold(0.0, f64::max)
    };

    Ok((
        output.clone(),
        FakeOutput {
            video_from: video_from.ok_or_else(|| fail("Output file does not contain any stream"))?,
            audio_from,
            audio_channels: channels,
            duration_secs,
        },
    ))
}

/// Input referenced by a stream specifier such as `1:a`
fn pick<'a>(inputs: &'a [TestMedia], spec: &str) -> Result<&'a TestMedia, EngineError> {
    spec.split(':')
        .next()
        .and_then(|i| i.parse::<usize>().ok())
        .and_then(|i| inputs.get(i))
        .ok_or_else(|| fail(format!("Invalid input index in {}", spec)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::CombinationMode;

    fn staged(media: &[TestMedia]) -> HashMap<String, Bytes> {
        media
            .iter()
            .map(|m| (m.name.clone(), Bytes::from(m.to_bytes())))
            .collect()
    }

    #[test]
    fn test_interpret_replace() {
        let files = staged(&[TestMedia::clip("v.mp4", 10.0), TestMedia::song("a.mp3", 4.0)]);
        let cmd = CombinationMode::Replace
            .strategy()
            .build("v.mp4", "a.mp3", "out.mp4");
        let (name, out) = interpret(cmd.as_slice(), &files).unwrap();
        assert_eq!(name, "out.mp4");
        assert_eq!(out.video_from, "v.mp4");
        assert_eq!(out.audio_from, vec!["a.mp3".to_string()]);
        assert_eq!(out.duration_secs, 4.0);
    }

    #[test]
    fn test_interpret_mix_needs_audio_in_video() {
        let files = staged(&[
            TestMedia::silent_clip("v.mp4", 10.0),
            TestMedia::song("a.mp3", 4.0),
        ]);
        let cmd = CombinationMode::Mix.strategy().build("v.mp4", "a.mp3", "out.mp4");
        let err = interpret(cmd.as_slice(), &files).unwrap_err();
        assert!(err.to_string().contains("matches no streams"));
    }

    #[test]
    fn test_interpret_without_shortest_uses_longest() {
        let files = staged(&[TestMedia::clip("v.mp4", 10.0), TestMedia::song("a.mp3", 4.0)]);
        let args: Vec<String> = ["-i", "v.mp4", "-i", "a.mp3", "-map", "0:v", "-map", "1:a", "o.mp4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (_, out) = interpret(&args, &files).unwrap();
        assert_eq!(out.duration_secs, 10.0);
    }

    #[test]
    fn test_interpret_missing_input() {
        let files = staged(&[TestMedia::clip("v.mp4", 10.0)]);
        let cmd = CombinationMode::Replace
            .strategy()
            .build("v.mp4", "a.mp3", "out.mp4");
        let err = interpret(cmd.as_slice(), &files).unwrap_err();
        assert!(err.to_string().contains("No such file"));
    }
}
