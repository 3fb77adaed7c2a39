//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `stratum-adapters` crate provides implementations. Every port is
//! `Send + Sync`; per-leaf work and emission run on a worker pool.

use crate::domain::{Document, DomainError, FlattenedDocument, RawDocument, RelativePath, Schema};
use crate::error::StratumResult;
use std::path::{Path, PathBuf};

/// Port for filesystem operations.
///
/// Implemented by:
/// - `stratum_adapters::filesystem::LocalFilesystem` (production)
/// - `stratum_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> StratumResult<()>;

    /// Write content to a file, replacing it if present.
    fn write_file(&self, path: &Path, content: &str) -> StratumResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// Port delivering the raw files of one corpus.
///
/// Implemented by:
/// - `stratum_adapters::corpus_source::FilesystemCorpusSource` (directory walk)
/// - `stratum_adapters::corpus_source::InMemoryCorpusSource` (testing, embedding)
#[cfg_attr(test, mockall::automock)]
pub trait CorpusSource: Send + Sync {
    /// On-disk root, when the corpus has one.
    fn root(&self) -> Option<PathBuf>;

    /// Every document file, sorted by relative path.
    fn load(&self) -> StratumResult<Vec<RawDocument>>;
}

/// Port decoding raw text into a document (the loader).
#[cfg_attr(test, mockall::automock)]
pub trait DocumentParser: Send + Sync {
    /// Fails with a parse-category `DomainError` on malformed input.
    fn parse(&self, raw: &RawDocument, schema: &Schema) -> Result<Document, DomainError>;
}

/// One line of the build manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub output: RelativePath,
    pub source: RelativePath,
    pub identity: Option<String>,
    pub content: String,
}

/// Port serializing flattened documents.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentRenderer: Send + Sync {
    /// Canonical text of one flattened document. Must be byte-identical for
    /// identical input.
    fn render(
        &self,
        document: &FlattenedDocument,
        schema: &Schema,
        provenance: bool,
    ) -> StratumResult<String>;

    /// Manifest describing a set of emitted documents.
    fn render_manifest(&self, entries: &[ManifestEntry]) -> StratumResult<String>;
}
