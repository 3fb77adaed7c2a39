//! Application layer for Stratum.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (BuildService, CorpusService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! inheritance rules itself. Those live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    BuildOptions, BuildReport, BuildService, BuildStatus, BuiltDocument, CorpusService,
    DocumentInfo, MANIFEST_FILE, Selection,
};

// Re-export port traits (for adapter implementation)
pub use ports::{CorpusSource, DocumentParser, DocumentRenderer, Filesystem, ManifestEntry};

pub use error::ApplicationError;
