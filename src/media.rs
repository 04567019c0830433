//! Media inputs selected by the user
//!
//! A `MediaInput` is created once per selection and replaced wholesale when
//! the user picks another file. `InputSlots` holds the current video and
//! audio selection for the next job.

use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{EngineError, InputError};

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "mkv", "webm", "avi", "mpg", "mpeg", "ts", "flv", "wmv", "3gp", "ogv",
];

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "aac", "wav", "flac", "ogg", "oga", "opus", "wma", "aiff", "aif", "weba",
];

/// Kind of media a slot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Classify a path by its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Audio)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => f.write_str("video"),
            Self::Audio => f.write_str("audio"),
        }
    }
}

/// Where the raw bytes of an input come from
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// A file on disk, read when the job stages it
    File(PathBuf),
    /// Bytes already in memory
    Memory(Bytes),
}

impl MediaSource {
    /// Read the full contents of the source
    pub async fn read(&self, name: &str) -> Result<Bytes, EngineError> {
        match self {
            Self::File(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| EngineError::staging(name, format!("{}: {}", path.display(), e))),
            Self::Memory(data) => Ok(data.clone()),
        }
    }
}

/// One user-selected input
#[derive(Debug, Clone)]
pub struct MediaInput {
    name: String,
    kind: MediaKind,
    source: MediaSource,
    preview: String,
}

impl MediaInput {
    /// Select a file from disk for the given slot.
    ///
    /// Kind and staging name come from the path as given, so a `clip.mp4`
    /// symlink to an extensionless blob is still a video named `clip.mp4`.
    /// The canonical path is what gets read and what the `file://` preview
    /// points at.
    pub fn from_path(path: impl AsRef<Path>, kind: MediaKind) -> Result<Self, InputError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let canonical = path
            .canonicalize()
            .map_err(|_| InputError::NotFound(display.clone()))?;
        if !canonical.is_file() {
            return Err(InputError::NotFound(display));
        }
        if MediaKind::from_path(path) != Some(kind) {
            return Err(InputError::UnsupportedMediaType {
                path: display,
                expected: kind,
            });
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| InputError::NotFound(display.clone()))?;
        let preview = Url::from_file_path(&canonical)
            .map(String::from)
            .unwrap_or_else(|_| display.clone());

        Ok(Self {
            name,
            kind,
            source: MediaSource::File(canonical),
            preview,
        })
    }

    /// Build an input from bytes already in memory
    pub fn from_bytes(name: impl Into<String>, kind: MediaKind, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let preview = format!("memory://inputs/{}", name);
        Self {
            name,
            kind,
            source: MediaSource::Memory(data.into()),
            preview,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Reference a user can open to preview the input
    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// Read the raw bytes for staging
    pub async fn read(&self) -> Result<Bytes, EngineError> {
        self.source.read(&self.name).await
    }
}

/// The current video and audio selection
#[derive(Debug, Clone, Default)]
pub struct InputSlots {
    video: Option<MediaInput>,
    audio: Option<MediaInput>,
}

impl InputSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the video selection
    pub fn select_video(&mut self, input: MediaInput) -> Result<(), InputError> {
        Self::check_kind(&input, MediaKind::Video)?;
        self.video = Some(input);
        Ok(())
    }

    /// Replace the audio selection
    pub fn select_audio(&mut self, input: MediaInput) -> Result<(), InputError> {
        Self::check_kind(&input, MediaKind::Audio)?;
        self.audio = Some(input);
        Ok(())
    }

    pub fn video(&self) -> Option<&MediaInput> {
        self.video.as_ref()
    }

    pub fn audio(&self) -> Option<&MediaInput> {
        self.audio.as_ref()
    }

    /// Both inputs, checked for presence and name clashes with each other
    /// and with the output file.
    pub fn pair(&self, output_name: &str) -> Result<(&MediaInput, &MediaInput), InputError> {
        let video = self
            .video
            .as_ref()
            .ok_or(InputError::Missing(MediaKind::Video))?;
        let audio = self
            .audio
            .as_ref()
            .ok_or(InputError::Missing(MediaKind::Audio))?;

        if video.name == audio.name {
            return Err(InputError::DuplicateName(video.name.clone()));
        }
        for input in [video, audio] {
            if input.name == output_name {
                return Err(InputError::ReservedName(input.name.clone()));
            }
        }
        Ok((video, audio))
    }

    fn check_kind(input: &MediaInput, expected: MediaKind) -> Result<(), InputError> {
        if input.kind != expected {
            return Err(InputError::UnsupportedMediaType {
                path: input.name.clone(),
                expected,
            });
        }
        Ok(())
    }
}
