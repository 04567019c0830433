use thiserror::Error;

use crate::media::MediaKind;

/// Main error type for the av-remix binary
#[derive(Error, Debug)]
pub enum RemixError {
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised by a media engine adapter.
///
/// Every variant is terminal for the job that hit it.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Engine failed to load: {0}")]
    Load(String),

    #[error("Failed to stage {name}: {message}")]
    Staging { name: String, message: String },

    #[error("Engine execution failed (exit code {exit_code:?}): {message}")]
    Execution {
        exit_code: Option<i32>,
        message: String,
    },

    #[error("Failed to retrieve {name}: {message}")]
    Retrieval { name: String, message: String },
}

impl EngineError {
    pub fn staging(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Staging {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn execution(exit_code: Option<i32>, message: impl Into<String>) -> Self {
        Self::Execution {
            exit_code,
            message: message.into(),
        }
    }

    pub fn retrieval(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Retrieval {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Short label used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Load(_) => "load",
            Self::Staging { .. } => "staging",
            Self::Execution { .. } => "execution",
            Self::Retrieval { .. } => "retrieval",
        }
    }
}

/// Input selection and validation errors
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input file not found: {0}")]
    NotFound(String),

    #[error("{path} is not a supported {expected} file")]
    UnsupportedMediaType { path: String, expected: MediaKind },

    #[error("No {0} input selected")]
    Missing(MediaKind),

    #[error("Video and audio inputs share the name {0}")]
    DuplicateName(String),

    #[error("Input name {0} collides with the output name")]
    ReservedName(String),
}

/// Anything that ends a job in the Failed state
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RemixError>;
