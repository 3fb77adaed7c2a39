//! Application layer errors.
//!
//! These errors represent failures in orchestration, not inheritance rules.
//! Parse, resolution, and merge errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// Corpus root missing or unreadable.
    #[error("Corpus not found at {path}")]
    CorpusNotFound { path: PathBuf },

    /// Requested document does not exist.
    #[error("No document matches '{selector}'")]
    DocumentNotFound { selector: String },

    /// Requested document matches more than one leaf.
    #[error("'{selector}' matches {} documents", candidates.len())]
    AmbiguousSelection {
        selector: String,
        candidates: Vec<String>,
    },

    /// Output would be written into the corpus being read.
    #[error("Output directory {output} is inside the corpus {corpus}")]
    OutputInsideCorpus { output: PathBuf, corpus: PathBuf },

    /// Document serialization failed.
    #[error("Rendering failed for {document}: {reason}")]
    RenderingFailed { document: String, reason: String },

    /// Worker pool could not be created.
    #[error("Worker pool setup failed: {reason}")]
    WorkerPool { reason: String },

    /// Store access failed (lock poisoned, etc.).
    #[error("Document store error")]
    StoreLockError,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have read and write permissions".into(),
            ],
            Self::CorpusNotFound { path } => vec![
                format!("Expected a directory of templates at {}", path.display()),
                "Pass --corpus or set build.corpus_dir in the config".into(),
            ],
            Self::DocumentNotFound { .. } => vec![
                "Documents can be named by path (engineer/python), name, or agent_id".into(),
                "Try: stratum list".into(),
            ],
            Self::AmbiguousSelection { candidates, .. } => vec![
                format!("Candidates: {}", candidates.join(", ")),
                "Name the document by its full path instead".into(),
            ],
            Self::OutputInsideCorpus { .. } => vec![
                "Choose an output directory outside the corpus".into(),
                "Use --output-dir to override".into(),
            ],
            Self::WorkerPool { .. } => vec!["Try a smaller --jobs value".into()],
            Self::StoreLockError => vec![
                "The document store is locked".into(),
                "Try again in a moment".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FilesystemError { .. } => ErrorCategory::Io,
            Self::CorpusNotFound { .. }
            | Self::DocumentNotFound { .. }
            | Self::AmbiguousSelection { .. } => ErrorCategory::NotFound,
            Self::OutputInsideCorpus { .. } | Self::WorkerPool { .. } => {
                ErrorCategory::Configuration
            }
            Self::RenderingFailed { .. } | Self::StoreLockError => ErrorCategory::Internal,
        }
    }
}
