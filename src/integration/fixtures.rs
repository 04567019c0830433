//! Test fixtures for integration tests
//!
//! Provides synthetic media inputs for testing without actual media files.
//! The bytes of each fixture carry its description as JSON, which is what
//! `FakeEngine` reads back to decide stream layout and duration.

use serde::{Deserialize, Serialize};

use crate::media::{MediaInput, MediaKind};

/// Test media file information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestMedia {
    pub name: String,
    pub description: String,
    pub has_video: bool,
    pub has_audio: bool,
    pub duration_secs: f64,
}

impl TestMedia {
    /// Video with its own soundtrack
    pub fn clip(name: &str, duration_secs: f64) -> Self {
        Self {
            name: name.to_string(),
            description: "H.264 video with AAC audio".to_string(),
            has_video: true,
            has_audio: true,
            duration_secs,
        }
    }

    /// Video without any audio stream
    pub fn silent_clip(name: &str, duration_secs: f64) -> Self {
        Self {
            name: name.to_string(),
            description: "H.264 video, no audio".to_string(),
            has_video: true,
            has_audio: false,
            duration_secs,
        }
    }

    /// Audio-only file
    pub fn song(name: &str, duration_secs: f64) -> Self {
        Self {
            name: name.to_string(),
            description: "MP3 audio".to_string(),
            has_video: false,
            has_audio: true,
            duration_secs,
        }
    }

    pub fn kind(&self) -> MediaKind {
        if self.has_video {
            MediaKind::Video
        } else {
            MediaKind::Audio
        }
    }

    /// Encoded form staged into the engine
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("fixture serializes")
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        serde_json::from_slice(data).ok()
    }

    /// In-memory input for an orchestrator slot
    pub fn input(&self) -> MediaInput {
        MediaInput::from_bytes(self.name.clone(), self.kind(), self.to_bytes())
    }
}

/// What `FakeEngine` writes as its output file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeOutput {
    pub video_from: String,
    pub audio_from: Vec<String>,
    pub audio_channels: Option<u32>,
    pub duration_secs: f64,
}

impl FakeOutput {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        serde_json::from_slice(data).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_kinds() {
        assert_eq!(TestMedia::clip("a.mp4", 1.0).kind(), MediaKind::Video);
        assert_eq!(TestMedia::silent_clip("a.mp4", 1.0).kind(), MediaKind::Video);
        assert_eq!(TestMedia::song("a.mp3", 1.0).kind(), MediaKind::Audio);
    }

    #[test]
    fn test_fixture_bytes_describe_media() {
        let song = TestMedia::song("song.mp3", 4.0);
        let parsed = TestMedia::from_bytes(&song.to_bytes()).unwrap();
        assert_eq!(parsed.duration_secs, 4.0);
        assert!(!parsed.has_video);
        assert!(TestMedia::from_bytes(b"not media").is_none());
    }
}
