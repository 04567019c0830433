//! Media engine module - the boundary to the external transcoder
//!
//! This module provides:
//! - The `MediaEngine` contract (load, stage, execute, retrieve)
//! - `EngineCommand`, the token sequence handed to the engine
//! - `FfmpegEngine`, which runs an ffmpeg executable in a scratch directory

pub mod ffmpeg;

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

use crate::error::EngineError;

pub use ffmpeg::FfmpegEngine;

/// Ordered argument tokens for one engine run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    args: Vec<String>,
}

impl EngineCommand {
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    /// Append one token
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several tokens
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl Default for EngineCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}

/// Contract for a transcoding engine with its own addressable filesystem.
///
/// Callers must respect the order `load` → `stage` (once per input) →
/// `execute` → `retrieve`. An engine keeps no state from one `load` to the
/// next, so every job stages its inputs again.
#[async_trait]
pub trait MediaEngine: Send {
    /// Prepare the engine for use
    async fn load(&mut self) -> Result<(), EngineError>;

    /// Copy `data` into the engine filesystem under `name`
    async fn stage(&mut self, name: &str, data: Bytes) -> Result<(), EngineError>;

    /// Run the engine over the staged files and wait for it to finish
    async fn execute(&mut self, command: &EngineCommand) -> Result<(), EngineError>;

    /// Read a file the engine produced
    async fn retrieve(&mut self, name: &str) -> Result<Bytes, EngineError>;
}
