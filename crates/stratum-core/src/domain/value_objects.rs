//! Domain value objects: CategoryPath, DocumentRole, MergeRule, ValueKind, Severity.
//!
//! # Design
//!
//! These are pure value types with equality by value. They hold no
//! corpus knowledge; the schema decides which rule or kind applies to a key,
//! and the corpus index decides which path belongs to which document. This
//! file's only job is to define the types, their string representations, and
//! their `FromStr` parsers.

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── CategoryPath ─────────────────────────────────────────────────────────────

/// Ordered sequence of category segments, e.g. `[engineer, backend]`.
///
/// The empty path is the corpus root. A base document found at a prefix path
/// applies to every document whose path begins with that prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryPath(Vec<String>);

impl CategoryPath {
    /// The corpus root (`[]`).
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a `/`-separated path. Empty segments are dropped, so `""` and
    /// `"/"` both denote the root. `.`, `..` and backslashes are refused:
    /// a category path only ever names a position beneath the corpus root.
    pub fn parse(s: &str) -> Result<Self, PathSegmentError> {
        s.split('/')
            .map(str::trim)
            .filter(|seg| !seg.is_empty())
            .map(|seg| match seg {
                "." | ".." => Err(PathSegmentError::Relative),
                _ if seg.contains('\\') => Err(PathSegmentError::Separator),
                _ => Ok(seg.to_string()),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// `true` if `self` equals `other` or lies beneath it.
    pub fn starts_with(&self, other: &CategoryPath) -> bool {
        self.0.starts_with(&other.0)
    }

    /// `true` if `self` lies strictly beneath `other`.
    pub fn is_strict_descendant_of(&self, other: &CategoryPath) -> bool {
        self.len() > other.len() && self.starts_with(other)
    }

    /// Strict prefixes, longest first: for `[a, b, c]` yields `[a, b]`, `[a]`, `[]`.
    pub fn strict_prefixes(&self) -> impl Iterator<Item = CategoryPath> + '_ {
        (0..self.0.len()).rev().map(|n| Self(self.0[..n].to_vec()))
    }

    /// `/`-joined form; the root renders as the empty string.
    pub fn as_slash_path(&self) -> String {
        self.0.join("/")
    }
}

impl fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.as_slash_path())
        }
    }
}

/// Why [`CategoryPath::parse`] refused a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathSegmentError {
    #[error("'.' and '..' segments are not allowed")]
    Relative,
    #[error("segments may not contain '\\'")]
    Separator,
}

// ── DocumentRole ─────────────────────────────────────────────────────────────

/// Whether a document contributes to descendants or is a build target.
///
/// A document is exclusively one or the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentRole {
    Base,
    Leaf,
}

impl DocumentRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Leaf => "leaf",
        }
    }
}

impl fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── MergeRule ────────────────────────────────────────────────────────────────

/// Per-field classification governing how chain values combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeRule {
    /// Later chain entry replaces earlier.
    #[default]
    Override,
    /// Lists concatenated root→leaf, duplicates removed keeping first occurrence.
    UnionList,
    /// Maps merged key-by-key using each sub-key's own rule.
    DeepMap,
    /// Leaf value only; must be unique across the corpus.
    Identity,
}

impl MergeRule {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::UnionList => "union-list",
            Self::DeepMap => "deep-map",
            Self::Identity => "identity",
        }
    }
}

impl fmt::Display for MergeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeRule {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "override" => Ok(Self::Override),
            "union-list" | "union_list" | "union" => Ok(Self::UnionList),
            "deep-map" | "deep_map" | "deep" => Ok(Self::DeepMap),
            "identity" | "id" => Ok(Self::Identity),
            other => Err(DomainError::InvalidSchema(format!(
                "unknown merge rule: {other}"
            ))),
        }
    }
}

// ── ValueKind ────────────────────────────────────────────────────────────────

/// Declared type of a metadata value, checked after merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Text,
    /// Integer or float.
    Number,
    Integer,
    Bool,
    List,
    Map,
    #[default]
    Any,
}

impl ValueKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Map => "map",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "string" | "str" => Ok(Self::Text),
            "number" | "float" => Ok(Self::Number),
            "integer" | "int" => Ok(Self::Integer),
            "bool" | "boolean" => Ok(Self::Bool),
            "list" | "array" => Ok(Self::List),
            "map" | "object" => Ok(Self::Map),
            "any" => Ok(Self::Any),
            other => Err(DomainError::InvalidSchema(format!(
                "unknown value kind: {other}"
            ))),
        }
    }
}

// ── Severity ─────────────────────────────────────────────────────────────────

/// Report severity. Warnings never block emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
