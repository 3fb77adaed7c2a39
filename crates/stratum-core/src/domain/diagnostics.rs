//! Report entries produced by validation and per-leaf failures.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::domain::error::{DomainError, ErrorCategory};
use crate::domain::value_objects::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    MissingField,
    EmptyField,
    InvalidEnum,
    OutOfBounds,
    UnresolvedReference,
    DuplicateIdentity,
    UnusedBase,
    ThinBody,
    MissingRecommended,
    /// Per-leaf resolution failure.
    Resolution,
    /// Per-leaf merge failure.
    Merge,
}

impl DiagnosticCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingField => "missing-field",
            Self::EmptyField => "empty-field",
            Self::InvalidEnum => "invalid-enum",
            Self::OutOfBounds => "out-of-bounds",
            Self::UnresolvedReference => "unresolved-reference",
            Self::DuplicateIdentity => "duplicate-identity",
            Self::UnusedBase => "unused-base",
            Self::ThinBody => "thin-body",
            Self::MissingRecommended => "missing-recommended",
            Self::Resolution => "resolution",
            Self::Merge => "merge",
        }
    }

    /// Codes that stand for a failed build step rather than a rule violation.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Resolution | Self::Merge)
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One report entry. The first location is the primary one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub locations: Vec<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(
        code: DiagnosticCode,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            code,
            locations: vec![location.into()],
            message: message.into(),
        }
    }

    pub fn warning(
        code: DiagnosticCode,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            locations: vec![location.into()],
            message: message.into(),
        }
    }

    /// Per-leaf failure from resolution or merging.
    pub fn from_leaf_failure(location: impl Into<String>, err: &DomainError) -> Self {
        let code = match err.category() {
            ErrorCategory::Merge => DiagnosticCode::Merge,
            _ => DiagnosticCode::Resolution,
        };
        Self::error(code, location, err.to_string())
    }

    pub fn with_locations(mut self, locations: Vec<String>) -> Self {
        self.locations = locations;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn primary_location(&self) -> &str {
        self.locations.first().map(String::as_str).unwrap_or("")
    }

    /// Whether this entry names `location` at all.
    pub fn concerns(&self, location: &str) -> bool {
        self.locations.iter().any(|l| l == location)
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        self.primary_location()
            .cmp(other.primary_location())
            .then_with(|| self.code.cmp(&other.code))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.locations.cmp(&other.locations))
            .then_with(|| self.severity.cmp(&other.severity))
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity,
            self.code,
            self.locations.join(", "),
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_location_then_code_then_message() {
        let mut diagnostics = vec![
            Diagnostic::error(DiagnosticCode::MissingField, "b.md", "z"),
            Diagnostic::warning(DiagnosticCode::ThinBody, "a.md", "short"),
            Diagnostic::error(DiagnosticCode::MissingField, "a.md", "y"),
            Diagnostic::error(DiagnosticCode::MissingField, "a.md", "x"),
        ];
        diagnostics.sort();

        let keys: Vec<_> = diagnostics
            .iter()
            .map(|d| (d.primary_location().to_string(), d.message.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a.md".to_string(), "x".to_string()),
                ("a.md".to_string(), "y".to_string()),
                ("a.md".to_string(), "short".to_string()),
                ("b.md".to_string(), "z".to_string()),
            ]
        );
    }

    #[test]
    fn display_lists_every_location() {
        let diagnostic = Diagnostic::error(DiagnosticCode::DuplicateIdentity, "a.md", "dup")
            .with_locations(vec!["a.md".into(), "b.md".into()]);
        assert_eq!(
            diagnostic.to_string(),
            "error[duplicate-identity] a.md, b.md: dup"
        );
        assert!(diagnostic.concerns("b.md"));
    }

    #[test]
    fn leaf_failures_map_to_codes() {
        let merge = DomainError::TypeMismatch {
            source_path: "a.md".into(),
            field: "temperature".into(),
            expected: crate::domain::value_objects::ValueKind::Number,
            found: "text",
        };
        assert_eq!(
            Diagnostic::from_leaf_failure("a.md", &merge).code,
            DiagnosticCode::Merge
        );
        assert!(DiagnosticCode::Merge.is_fatal());
        assert!(!DiagnosticCode::MissingField.is_fatal());
    }
}
