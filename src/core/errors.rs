//! Shared error types for the analysis pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Run-level error. Any of these ends an analysis without producing metrics.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The repository root does not exist or is not a directory
    #[error("Path not found: {}", path.display())]
    PathNotFound { path: PathBuf },

    /// The candidate files exceed the total size ceiling
    #[error("Input too large: {total_bytes} bytes exceeds the {limit_bytes} byte ceiling")]
    InputTooLarge { total_bytes: u64, limit_bytes: u64 },

    /// The run was cancelled by the caller
    #[error("Analysis cancelled")]
    Cancelled,

    /// The coordinator was driven through an illegal state change
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Why a single file was skipped.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The file is not valid Python
    Parse,
    /// Reading and parsing took longer than the per-file timeout
    Timeout,
    /// The file is larger than the per-file byte ceiling
    TooLarge,
    /// The file or directory entry could not be read
    Unreadable,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FailureKind::Parse => "parse error",
            FailureKind::Timeout => "timeout exceeded",
            FailureKind::TooLarge => "size ceiling exceeded",
            FailureKind::Unreadable => "unreadable",
        };
        write!(f, "{label}")
    }
}

/// Soft, per-file failure. Recorded in the result and never aborts a run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl FileFailure {
    pub fn new(path: impl Into<PathBuf>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(path, FailureKind::Parse, message)
    }

    pub fn timeout(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(path, FailureKind::Timeout, message)
    }
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.path.display(), self.kind, self.message)
    }
}
