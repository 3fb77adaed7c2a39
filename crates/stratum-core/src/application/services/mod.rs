//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "build the corpus" or "list documents".

pub mod build_service;
pub mod corpus_service;

pub use build_service::{
    BuildOptions, BuildReport, BuildService, BuildStatus, BuiltDocument, MANIFEST_FILE, Selection,
};
pub use corpus_service::{CorpusService, DocumentInfo};
