//! Infrastructure adapters for Stratum.
//!
//! This crate implements the ports defined in `stratum-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod corpus_source;
pub mod document_loader;
pub mod filesystem;
pub mod renderer;

// Re-export commonly used adapters
pub use corpus_source::{FilesystemCorpusSource, InMemoryCorpusSource};
pub use document_loader::FrontmatterParser;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use renderer::MarkdownRenderer;
