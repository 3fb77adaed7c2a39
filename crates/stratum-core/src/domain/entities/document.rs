//! Source documents: metadata values, body blocks, and the document itself.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::common::RelativePath;
use crate::domain::error::DomainError;
use crate::domain::value_objects::{CategoryPath, DocumentRole, ValueKind};

/// File name reserved for base documents.
pub const BASE_FILE_NAME: &str = "BASE-AGENT.md";

/// Name of the marker that splices the parent's composed body.
pub const PARENT_MARKER: &str = "parent";

/// Metadata key that redirects upstream ancestry to another base.
pub const EXTENDS_KEY: &str = "extends";

/// Metadata key that declares a document's category explicitly.
pub const CATEGORY_KEY: &str = "category";

// ============================================================================
// Metadata values
// ============================================================================

/// A metadata value: scalar, list, or string-keyed map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<MetaValue>),
    Map(BTreeMap<String, MetaValue>),
}

/// Top-level metadata of a document.
pub type Metadata = BTreeMap<String, MetaValue>;

impl MetaValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "number",
            Self::Str(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Whether the value satisfies a declared kind. Integers count as numbers.
    pub fn matches(&self, kind: ValueKind) -> bool {
        match kind {
            ValueKind::Any => true,
            ValueKind::Text => matches!(self, Self::Str(_)),
            ValueKind::Number => matches!(self, Self::Int(_) | Self::Float(_)),
            ValueKind::Integer => matches!(self, Self::Int(_)),
            ValueKind::Bool => matches!(self, Self::Bool(_)),
            ValueKind::List => matches!(self, Self::List(_)),
            ValueKind::Map => matches!(self, Self::Map(_)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Null, a blank string, or an empty collection.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Str(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[MetaValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, MetaValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for MetaValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<MetaValue>> From<Vec<T>> for MetaValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// Body
// ============================================================================

/// A run of body text, or a recognized insertion marker on its own line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyBlock {
    Text(String),
    Marker(String),
}

/// Document body, opaque apart from recognized markers.
///
/// A marker is a line whose trimmed content is exactly `{{name}}` for a known
/// name. Lines inside fenced code blocks are never markers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Body {
    blocks: Vec<BodyBlock>,
}

impl Body {
    pub fn parse(text: &str) -> Self {
        let mut blocks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        let mut fence: Option<&'static str> = None;

        for line in text.lines() {
            let trimmed = line.trim();

            match fence {
                Some(open) if trimmed.starts_with(open) => fence = None,
                Some(_) => {}
                None => {
                    if let Some(open) = fence_opener(trimmed) {
                        fence = Some(open);
                    } else if let Some(name) = marker_name(trimmed) {
                        flush(&mut pending, &mut blocks);
                        blocks.push(BodyBlock::Marker(name.to_string()));
                        continue;
                    }
                }
            }
            pending.push(line);
        }
        flush(&mut pending, &mut blocks);

        Self { blocks }
    }

    pub fn blocks(&self) -> &[BodyBlock] {
        &self.blocks
    }

    pub fn marker_count(&self, name: &str) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, BodyBlock::Marker(m) if m == name))
            .count()
    }

    pub fn has_marker(&self, name: &str) -> bool {
        self.marker_count(name) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| match b {
            BodyBlock::Text(t) => t.trim().is_empty(),
            BodyBlock::Marker(_) => false,
        })
    }

    /// Body text with markers written back in their source form.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| match b {
                BodyBlock::Text(t) => t.clone(),
                BodyBlock::Marker(m) => format!("{{{{{m}}}}}"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn flush(pending: &mut Vec<&str>, blocks: &mut Vec<BodyBlock>) {
    if !pending.is_empty() {
        blocks.push(BodyBlock::Text(pending.join("\n")));
        pending.clear();
    }
}

fn fence_opener(trimmed: &str) -> Option<&'static str> {
    ["```", "~~~"].into_iter().find(|f| trimmed.starts_with(f))
}

fn marker_name(trimmed: &str) -> Option<&str> {
    let inner = trimmed.strip_prefix("{{")?.strip_suffix("}}")?.trim();
    (inner == PARENT_MARKER).then_some(inner)
}

// ============================================================================
// Documents
// ============================================================================

/// Undecoded file content as delivered by a corpus source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub relative_path: RelativePath,
    pub text: String,
}

impl RawDocument {
    pub fn new(relative_path: RelativePath, text: impl Into<String>) -> Self {
        Self {
            relative_path,
            text: text.into(),
        }
    }

    pub fn role(&self) -> DocumentRole {
        if self.relative_path.file_name() == Some(BASE_FILE_NAME) {
            DocumentRole::Base
        } else {
            DocumentRole::Leaf
        }
    }
}

/// A parsed source document. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub source: RelativePath,
    pub role: DocumentRole,
    /// File stem; `BASE-AGENT` for every base.
    pub name: String,
    /// Category implied by the file's location.
    pub directory: CategoryPath,
    pub metadata: Metadata,
    pub body: Body,
}

impl Document {
    pub fn new(
        source: RelativePath,
        role: DocumentRole,
        metadata: Metadata,
        body: Body,
    ) -> Result<Self, DomainError> {
        let directory = CategoryPath::new(source.parent_segments());
        let name = source
            .file_stem()
            .map(str::to_string)
            .ok_or_else(|| DomainError::MalformedFrontmatter {
                source_path: source.to_string(),
                reason: "document file has no name".into(),
            })?;

        for key in [CATEGORY_KEY, EXTENDS_KEY] {
            if let Some(value) = metadata.get(key).and_then(MetaValue::as_str) {
                CategoryPath::parse(value).map_err(|reason| DomainError::InvalidCategoryPath {
                    source_path: source.to_string(),
                    key,
                    value: value.to_string(),
                    reason,
                })?;
            }
        }

        Ok(Self {
            source,
            role,
            name,
            directory,
            metadata,
            body,
        })
    }

    pub fn is_base(&self) -> bool {
        self.role == DocumentRole::Base
    }

    /// Category named by the `category` key, if present.
    pub fn declared_category(&self) -> Option<CategoryPath> {
        self.structural(CATEGORY_KEY)
    }

    /// Base path named by the `extends` key, if present.
    pub fn extends(&self) -> Option<CategoryPath> {
        self.structural(EXTENDS_KEY)
    }

    // Validated by `new`, so a value that fails to parse is absent.
    fn structural(&self, key: &str) -> Option<CategoryPath> {
        self.metadata
            .get(key)
            .and_then(MetaValue::as_str)
            .and_then(|value| CategoryPath::parse(value).ok())
    }

    /// Category of the document itself, before the leaf name is appended.
    pub fn category(&self) -> CategoryPath {
        self.declared_category()
            .unwrap_or_else(|| self.directory.clone())
    }

    /// Position in the hierarchy: the category for bases, category plus
    /// name for leaves.
    pub fn path(&self) -> CategoryPath {
        match self.role {
            DocumentRole::Base => self.category(),
            DocumentRole::Leaf => self.category().child(&self.name),
        }
    }

    pub fn location(&self) -> String {
        self.source.to_string()
    }
}
