//! Audio combination strategies
//!
//! Each strategy turns a video input name, an audio input name and an output
//! name into the engine command that combines them. Both cut the output at
//! the end of the shorter input.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::EngineCommand;

/// How the audio file is combined with the video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinationMode {
    /// Drop the video's own audio and use the audio file instead
    Replace,
    /// Merge both soundtracks into one stereo track
    #[default]
    Mix,
}

impl CombinationMode {
    /// Mode for the "replace audio" toggle
    pub fn from_replace_flag(replace_audio: bool) -> Self {
        if replace_audio {
            Self::Replace
        } else {
            Self::Mix
        }
    }

    /// Strategy implementing this mode
    pub fn strategy(self) -> &'static dyn CombineStrategy {
        match self {
            Self::Replace => &ReplaceAudio,
            Self::Mix => &MixAudio,
        }
    }
}

impl fmt::Display for CombinationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.strategy().name())
    }
}

/// Builds the engine command for one combination mode
pub trait CombineStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn build(&self, video: &str, audio: &str, output: &str) -> EngineCommand;
}

/// Copies the first input's video and the second input's audio unchanged.
///
/// No re-encoding, so it is fast and lossless; the soundtrack keeps whatever
/// codec the audio file had.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceAudio;

impl CombineStrategy for ReplaceAudio {
    fn name(&self) -> &'static str {
        "replace"
    }

    fn build(&self, video: &str, audio: &str, output: &str) -> EngineCommand {
        EngineCommand::new()
            .args(["-i", video])
            .args(["-i", audio])
            .args(["-map", "0:v"])
            .args(["-map", "1:a"])
            .args(["-c", "copy"])
            .arg("-shortest")
            .arg(output)
    }
}

/// Merges both audio streams with `amerge`, downmixed to two channels.
/// Video is copied; only the audio is encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct MixAudio;

impl CombineStrategy for MixAudio {
    fn name(&self) -> &'static str {
        "mix"
    }

    fn build(&self, video: &str, audio: &str, output: &str) -> EngineCommand {
        EngineCommand::new()
            .args(["-i", video])
            .args(["-i", audio])
            .args(["-filter_complex", "[0:a][1:a]amerge=inputs=2[a]"])
            .args(["-map", "0:v"])
            .args(["-map", "[a]"])
            .args(["-c:v", "copy"])
            .args(["-ac", "2"])
            .arg("-shortest")
            .arg(output)
    }
}
