//! Diff engine error types

use thiserror::Error;

/// Errors raised while parsing, applying or committing unified diffs.
///
/// Every variant is detected before the workspace is mutated, except `Io`
/// which can surface from the commit itself (and triggers a rollback).
#[derive(Debug, Error)]
pub enum DiffError {
    /// Malformed diff structure
    #[error("malformed diff at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Patch context does not match the base content
    #[error("conflict in {path}: {detail}")]
    Conflict { path: String, detail: String },

    /// Creation over an existing file, or modification of a missing one
    #[error("invalid file state for {path}: {detail}")]
    State { path: String, detail: String },

    /// Target path escapes the workspace root
    #[error("access denied: path '{path}' is outside the workspace")]
    Security { path: String },

    /// Operation the applier deliberately does not implement (renames)
    #[error("unsupported operation on {path}: {detail}")]
    Unsupported { path: String, detail: String },

    /// Filesystem failure while reading state or committing an edit
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiffError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        DiffError::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn conflict(path: impl Into<String>, detail: impl Into<String>) -> Self {
        DiffError::Conflict {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn state(path: impl Into<String>, detail: impl Into<String>) -> Self {
        DiffError::State {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Short machine-friendly label, used in tool output and logs
    pub fn kind(&self) -> &'static str {
        match self {
            DiffError::Parse { .. } => "parse",
            DiffError::Conflict { .. } => "conflict",
            DiffError::State { .. } => "state",
            DiffError::Security { .. } => "security",
            DiffError::Unsupported { .. } => "unsupported",
            DiffError::Io(_) => "io",
        }
    }
}
