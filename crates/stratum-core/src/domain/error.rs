// ============================================================================
// domain/error.rs - PARSE / RESOLUTION / MERGE ERRORS
// ============================================================================

use thiserror::Error;

use crate::domain::value_objects::{CategoryPath, MergeRule, PathSegmentError, ValueKind};

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (reported per document and collected across worker threads)
/// - Categorizable (parse, resolution, merge)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Parse Errors (whole build aborts)
    // ========================================================================
    #[error("{source_path}: malformed frontmatter: {reason}")]
    MalformedFrontmatter { source_path: String, reason: String },

    #[error("{source_path}: invalid metadata: {reason}")]
    InvalidMetadata { source_path: String, reason: String },

    #[error("{source_path}: duplicate metadata key '{key}'")]
    DuplicateKey { source_path: String, key: String },

    #[error("{source_path}: '{field}' is {rule} and needs a {expected}, found {found}")]
    ShapeConflict {
        source_path: String,
        field: String,
        rule: MergeRule,
        expected: ValueKind,
        found: &'static str,
    },

    #[error("{source_path}: marker '{{{{{marker}}}}}' appears more than once")]
    DuplicateMarker { source_path: String, marker: String },

    #[error("{source_path}: '{key}: {value}' is not a category path: {reason}")]
    InvalidCategoryPath {
        source_path: String,
        key: &'static str,
        value: String,
        #[source]
        reason: PathSegmentError,
    },

    // ========================================================================
    // Resolution Errors
    // ========================================================================
    #[error("two base documents claim {path}: {first} and {second}")]
    DuplicateBase {
        path: CategoryPath,
        first: String,
        second: String,
    },

    #[error("two documents claim {path}: {first} and {second}")]
    DuplicateLeaf {
        path: CategoryPath,
        first: String,
        second: String,
    },

    #[error("{leaf} resolves to {path}, which is already a base ({base})")]
    LeafShadowsBase {
        path: CategoryPath,
        leaf: String,
        base: String,
    },

    #[error("{source_path}: declared category {declared} does not match its location {directory}")]
    StructuralMismatch {
        source_path: String,
        declared: CategoryPath,
        directory: CategoryPath,
    },

    #[error("inheritance cycle: {chain}")]
    Cycle { chain: String },

    #[error("{source_path}: no base document at {target}")]
    MissingAncestor {
        source_path: String,
        target: CategoryPath,
    },

    // ========================================================================
    // Merge Errors
    // ========================================================================
    #[error("{source_path}: '{field}' should be {expected} after merging, found {found}")]
    TypeMismatch {
        source_path: String,
        field: String,
        expected: ValueKind,
        found: &'static str,
    },

    // ========================================================================
    // Construction
    // ========================================================================
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("Path must stay beneath its root: {path}")]
    PathEscapesRoot { path: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MalformedFrontmatter { .. } => vec![
                "Metadata must open with '---' on the first line".into(),
                "Close the metadata block with a second '---' line".into(),
            ],
            Self::DuplicateKey { key, .. } => vec![format!("Remove one of the '{key}' entries")],
            Self::ShapeConflict { field, expected, .. } => vec![
                format!("'{field}' must be written as a {expected}"),
                "Run 'stratum build --validate' after fixing to re-check".into(),
            ],
            Self::DuplicateMarker { .. } => vec!["Keep a single parent marker per body".into()],
            Self::InvalidCategoryPath { key, .. } => vec![
                format!("Write '{key}' as names separated by '/', e.g. engineer/backend"),
                "Paths are relative to the corpus root; '.' and '..' are not allowed".into(),
            ],
            Self::DuplicateBase { path, .. } | Self::DuplicateLeaf { path, .. } => vec![
                format!("Only one document may live at {path}"),
                "Rename or move one of the files".into(),
            ],
            Self::LeafShadowsBase { .. } => vec![
                "A document and a category directory cannot share a name".into(),
                "Rename the document file or the directory".into(),
            ],
            Self::StructuralMismatch { directory, .. } => vec![format!(
                "Remove the 'category' key or move the file under {directory}"
            )],
            Self::Cycle { .. } => vec![
                "Check the 'extends' keys along the reported chain".into(),
                "A base may not extend itself or one of its descendants".into(),
            ],
            Self::MissingAncestor { target, .. } => vec![
                format!("Create a base document in {target}"),
                "Or point 'extends' at an existing category".into(),
            ],
            Self::TypeMismatch { field, expected, .. } => vec![format!(
                "Check every '{field}' along the inheritance chain is a {expected}"
            )],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display and report codes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedFrontmatter { .. }
            | Self::InvalidMetadata { .. }
            | Self::DuplicateKey { .. }
            | Self::ShapeConflict { .. }
            | Self::DuplicateMarker { .. }
            | Self::InvalidCategoryPath { .. } => ErrorCategory::Parse,
            Self::DuplicateBase { .. }
            | Self::DuplicateLeaf { .. }
            | Self::LeafShadowsBase { .. }
            | Self::StructuralMismatch { .. }
            | Self::Cycle { .. }
            | Self::MissingAncestor { .. } => ErrorCategory::Resolution,
            Self::TypeMismatch { .. } => ErrorCategory::Merge,
            Self::InvalidSchema(_)
            | Self::AbsolutePathNotAllowed { .. }
            | Self::PathEscapesRoot { .. } => ErrorCategory::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Resolution,
    Merge,
    Internal,
}
