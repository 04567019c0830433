//! ffmpeg engine adapter
//!
//! Runs an ffmpeg executable as a child process. Each `load` creates a fresh
//! scratch directory that plays the role of the engine's in-memory
//! filesystem: inputs are staged into it, ffmpeg runs with it as working
//! directory, and the output is read back from it.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use uuid::Uuid;

use super::{EngineCommand, MediaEngine};
use crate::config::EngineConfig;
use crate::error::EngineError;

/// Number of trailing stderr lines kept for error reports
const STDERR_TAIL_LINES: usize = 20;

/// Engine backed by the ffmpeg command-line tool
#[derive(Debug)]
pub struct FfmpegEngine {
    config: EngineConfig,
    scratch: Option<PathBuf>,
    version: Option<String>,
}

impl FfmpegEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            scratch: None,
            version: None,
        }
    }

    /// Scratch directory of the current load, if any
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_deref()
    }

    /// First line of `ffmpeg -version`, known after `load`
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    async fn query_version(&self) -> Result<String, EngineError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::Load(format!("{} not found", self.config.ffmpeg_path))
                } else {
                    EngineError::Load(format!("failed to run {}: {}", self.config.ffmpeg_path, e))
                }
            })?;

        if !output.status.success() {
            return Err(EngineError::Load(format!(
                "{} -version exited with {}",
                self.config.ffmpeg_path, output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string())
    }

    /// Resolve `name` inside the scratch directory.
    ///
    /// Only plain file names are accepted so nothing escapes the scratch dir.
    fn resolve(&self, name: &str) -> Result<PathBuf, String> {
        let scratch = self
            .scratch
            .as_ref()
            .ok_or_else(|| "engine not loaded".to_string())?;

        let is_plain = !name.is_empty()
            && name != "."
            && name != ".."
            && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
        if !is_plain {
            return Err(format!("{:?} is not a plain file name", name));
        }
        Ok(scratch.join(name))
    }

    fn discard_scratch(&mut self) {
        if let Some(dir) = self.scratch.take() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                tracing::warn!("Failed to remove scratch dir {}: {}", dir.display(), e);
            } else {
                tracing::debug!("Removed scratch dir {}", dir.display());
            }
        }
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn load(&mut self) -> Result<(), EngineError> {
        let version = self.query_version().await?;
        tracing::info!("Engine ready: {}", version);
        self.version = Some(version);

        self.discard_scratch();
        let dir = self
            .config
            .work_dir
            .join(format!("av-remix-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            EngineError::Load(format!("cannot create {}: {}", dir.display(), e))
        })?;
        tracing::debug!("Scratch dir {}", dir.display());
        self.scratch = Some(dir);
        Ok(())
    }

    async fn stage(&mut self, name: &str, data: Bytes) -> Result<(), EngineError> {
        let path = self
            .resolve(name)
            .map_err(|message| EngineError::staging(name, message))?;
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| EngineError::staging(name, e.to_string()))?;
        tracing::debug!("Staged {} ({} bytes)", name, data.len());
        Ok(())
    }

    async fn execute(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        let scratch = self
            .scratch
            .clone()
            .ok_or_else(|| EngineError::execution(None, "engine not loaded"))?;

        tracing::info!("Running {} {}", self.config.ffmpeg_path, command);
        let mut child = Command::new(&self.config.ffmpeg_path)
            .current_dir(&scratch)
            .args(["-hide_banner", "-nostdin", "-loglevel"])
            .arg(&self.config.log_level)
            .args(command.as_slice())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EngineError::execution(
                    None,
                    format!("failed to spawn {}: {}", self.config.ffmpeg_path, e),
                )
            })?;

        let tail = match child.stderr.take() {
            Some(stderr) => drain_stderr(stderr).await,
            None => VecDeque::new(),
        };

        let status = child
            .wait()
            .await
            .map_err(|e| EngineError::execution(None, format!("failed to wait for engine: {}", e)))?;

        if !status.success() {
            let detail = Vec::from(tail).join("\n");
            return Err(EngineError::execution(
                status.code(),
                if detail.is_empty() {
                    format!("engine exited with {}", status)
                } else {
                    detail
                },
            ));
        }
        Ok(())
    }

    async fn retrieve(&mut self, name: &str) -> Result<Bytes, EngineError> {
        let path = self
            .resolve(name)
            .map_err(|message| EngineError::retrieval(name, message))?;
        match tokio::fs::read(&path).await {
            Ok(data) => {
                tracing::debug!("Retrieved {} ({} bytes)", name, data.len());
                Ok(Bytes::from(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(EngineError::retrieval(
                name,
                "file was not produced by the engine",
            )),
            Err(e) => Err(EngineError::retrieval(name, e.to_string())),
        }
    }
}

/// Log every stderr line and return the last few. Lines are decoded lossily
/// and the pipe is read to EOF even after an error, otherwise the child
/// blocks or dies on SIGPIPE.
async fn drain_stderr<R: AsyncRead + Unpin>(stderr: R) -> VecDeque<String> {
    let mut reader = BufReader::new(stderr);
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                tracing::debug!(target: "av_remix::engine", "{}", line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!("Reading engine stderr failed: {}", e);
                let mut sink = tokio::io::sink();
                if let Err(e) = tokio::io::copy(&mut reader, &mut sink).await {
                    tracing::warn!("Discarding engine stderr failed: {}", e);
                }
                break;
            }
        }
    }
    tail
}

impl Drop for FfmpegEngine {
    fn drop(&mut self) {
        self.discard_scratch();
    }
}
