// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Stratum.
//!
//! This module contains the pure inheritance engine. Reading files, writing
//! output, and decoding the metadata format are handled via ports (traits)
//! defined in the application layer.
//!
//! ## Pipeline
//!
//! - **CorpusIndex**: arena of documents keyed by category path
//! - **AncestorChain**: root-to-leaf chain for one leaf
//! - **merge_metadata / compose_body**: pure functions of the chain
//! - **DomainValidator**: per-document and corpus-wide checks
//!
//! Every stage is synchronous and free of I/O; the index is shared read-only
//! across worker threads.
pub mod diagnostics;
pub mod entities;
pub mod error;
pub mod schema;
pub mod value_objects;

mod validation;

pub use diagnostics::{Diagnostic, DiagnosticCode};
pub use entities::{
    AncestorChain, Body, BodyBlock, ComposedBody, CorpusIndex, DocIdx, Document,
    FlattenedDocument, MetaValue, Metadata, RawDocument, RelativePath, Segment, Spacing,
    document::{BASE_FILE_NAME, CATEGORY_KEY, EXTENDS_KEY, PARENT_MARKER},
};
pub use error::{DomainError, ErrorCategory};
pub use schema::{AGENT_TYPES, Bounds, FieldSpec, Schema, canonical_position, find_field};
pub use validation::{DomainValidator, MergedLeaf, ValidationContext};
pub use value_objects::{
    CategoryPath, DocumentRole, MergeRule, PathSegmentError, Severity, ValueKind,
};
