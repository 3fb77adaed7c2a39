//! Frontmatter document parser.
//!
//! Decodes one markdown file into a domain [`Document`]. The file must open
//! with a YAML mapping between two `---` lines; everything after the closing
//! delimiter is the body.
//!
//! # File format
//!
//! ```text
//! ---
//! name: Python Engineer
//! agent_id: python-engineer
//! skills: [pytest, mypy]
//! knowledge:
//!   best_practices: ["type hints everywhere"]
//! ---
//! You write idiomatic Python.
//!
//! {{parent}}
//! ```
//!
//! Shapes are checked against the schema here so that a `union-list` field
//! written as a string fails at load time with the offending file named,
//! rather than later during the merge.

use serde_yaml::Value;
use tracing::{instrument, trace};

use stratum_core::{
    application::ports::DocumentParser,
    domain::{
        Body, Document, DomainError, FieldSpec, MergeRule, MetaValue, Metadata, PARENT_MARKER,
        RawDocument, Schema, ValueKind,
    },
};

/// Frontmatter delimiter line.
const DELIMITER: &str = "---";

/// Parser for `---`-delimited YAML frontmatter documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontmatterParser;

impl FrontmatterParser {
    /// Create a new frontmatter parser.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for FrontmatterParser {
    #[instrument(skip_all, fields(source = %raw.relative_path))]
    fn parse(&self, raw: &RawDocument, schema: &Schema) -> Result<Document, DomainError> {
        let source_path = raw.relative_path.to_string();

        let (front, body) = split_frontmatter(&raw.text).map_err(|reason| {
            DomainError::MalformedFrontmatter {
                source_path: source_path.clone(),
                reason: reason.into(),
            }
        })?;

        if let Some(key) = first_duplicate_key(front) {
            return Err(DomainError::DuplicateKey { source_path, key });
        }

        let value: Value =
            serde_yaml::from_str(front).map_err(|e| DomainError::MalformedFrontmatter {
                source_path: source_path.clone(),
                reason: e.to_string(),
            })?;

        let metadata = match value {
            // Empty frontmatter.
            Value::Null => Metadata::new(),
            Value::Mapping(mapping) => convert_mapping(mapping, &source_path)?,
            other => {
                return Err(DomainError::InvalidMetadata {
                    source_path,
                    reason: format!("expected a mapping, found {}", yaml_kind(&other)),
                });
            }
        };

        check_shapes(&metadata, schema.fields(), "", &source_path)?;

        let body = Body::parse(body.trim_start_matches(['\r', '\n']).trim_end());
        if body.marker_count(PARENT_MARKER) > 1 {
            return Err(DomainError::DuplicateMarker {
                source_path,
                marker: PARENT_MARKER.into(),
            });
        }

        trace!(keys = metadata.len(), blocks = body.blocks().len(), "parsed document");
        Document::new(raw.relative_path.clone(), raw.role(), metadata, body)
    }
}

// ── Splitting ─────────────────────────────────────────────────────────────────

/// Split file text into `(frontmatter, body)`.
fn split_frontmatter(text: &str) -> Result<(&str, &str), &'static str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');

    let first = lines.next().ok_or("file is empty")?;
    if first.trim_end() != DELIMITER {
        return Err("missing opening '---' delimiter");
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Ok((&text[start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err("missing closing '---' delimiter")
}

/// First top-level key written twice in block-style frontmatter.
///
/// YAML decoders disagree on whether duplicates are an error, so they are
/// caught here before decoding.
fn first_duplicate_key(front: &str) -> Option<String> {
    let mut seen = std::collections::BTreeSet::new();

    for line in front.lines() {
        if line.starts_with([' ', '\t', '#', '-', '{', '[']) || line.trim().is_empty() {
            continue;
        }
        let Some((key, _)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().trim_matches(['"', '\'']).to_string();
        if !seen.insert(key.clone()) {
            return Some(key);
        }
    }
    None
}

// ── Conversion ────────────────────────────────────────────────────────────────

fn convert_mapping(
    mapping: serde_yaml::Mapping,
    source_path: &str,
) -> Result<Metadata, DomainError> {
    let mut out = Metadata::new();
    for (key, value) in mapping {
        let Value::String(key) = key else {
            return Err(DomainError::InvalidMetadata {
                source_path: source_path.to_string(),
                reason: format!("keys must be strings, found {}", yaml_kind(&key)),
            });
        };
        if out.contains_key(&key) {
            return Err(DomainError::DuplicateKey {
                source_path: source_path.to_string(),
                key,
            });
        }
        let value = convert(value, source_path)?;
        out.insert(key, value);
    }
    Ok(out)
}

fn convert(value: Value, source_path: &str) -> Result<MetaValue, DomainError> {
    Ok(match value {
        Value::Null => MetaValue::Null,
        Value::Bool(b) => MetaValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => MetaValue::Int(i),
            None => MetaValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => MetaValue::Str(s),
        Value::Sequence(items) => MetaValue::List(
            items
                .into_iter()
                .map(|item| convert(item, source_path))
                .collect::<Result<_, _>>()?,
        ),
        Value::Mapping(mapping) => MetaValue::Map(convert_mapping(mapping, source_path)?),
        // Tags such as `!include` carry no meaning here; keep the value.
        Value::Tagged(tagged) => convert(tagged.value, source_path)?,
    })
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "map",
        Value::Tagged(_) => "tagged value",
    }
}

// ── Shape checks ──────────────────────────────────────────────────────────────

/// Reject values whose shape contradicts the field's merge rule.
fn check_shapes(
    metadata: &Metadata,
    fields: &[FieldSpec],
    prefix: &str,
    source_path: &str,
) -> Result<(), DomainError> {
    for spec in fields {
        let Some(value) = metadata.get(&spec.name).filter(|v| !v.is_null()) else {
            continue;
        };
        let field = format!("{prefix}{}", spec.name);

        let conflict = |expected: ValueKind| DomainError::ShapeConflict {
            source_path: source_path.to_string(),
            field: field.clone(),
            rule: spec.rule,
            expected,
            found: value.kind_name(),
        };

        match spec.rule {
            MergeRule::UnionList if value.as_list().is_none() => {
                return Err(conflict(ValueKind::List));
            }
            MergeRule::DeepMap => {
                let map = value.as_map().ok_or_else(|| conflict(ValueKind::Map))?;
                check_shapes(map, &spec.fields, &format!("{field}."), source_path)?;
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::domain::{BodyBlock, DocumentRole, RelativePath};

    fn parse(path: &str, text: &str) -> Result<Document, DomainError> {
        let raw = RawDocument::new(RelativePath::try_new(path).unwrap(), text);
        FrontmatterParser::new().parse(&raw, &Schema::agent())
    }

    // ── happy path ────────────────────────────────────────────────────────

    #[test]
    fn parses_metadata_and_body() {
        let doc = parse(
            "engineer/python.md",
            "---\nname: Python\ntemperature: 0.3\nmax_tokens: 4096\nskills: [pytest]\n---\n\nWrite Python.\n",
        )
        .unwrap();

        assert_eq!(doc.role, DocumentRole::Leaf);
        assert_eq!(doc.name, "python");
        assert_eq!(doc.metadata["name"], MetaValue::from("Python"));
        assert_eq!(doc.metadata["temperature"], MetaValue::Float(0.3));
        assert_eq!(doc.metadata["max_tokens"], MetaValue::Int(4096));
        assert_eq!(doc.metadata["skills"], MetaValue::from(vec!["pytest"]));
        assert_eq!(doc.body.text(), "Write Python.");
    }

    #[test]
    fn base_file_name_marks_base_role() {
        let doc = parse("engineer/BASE-AGENT.md", "---\n---\nShared.").unwrap();
        assert_eq!(doc.role, DocumentRole::Base);
        assert!(doc.metadata.is_empty());
    }

    #[test]
    fn nested_maps_keep_their_structure() {
        let doc = parse(
            "qa.md",
            "---\nknowledge:\n  best_practices:\n    - test first\n---\n",
        )
        .unwrap();
        let knowledge = doc.metadata["knowledge"].as_map().unwrap();
        assert_eq!(
            knowledge["best_practices"],
            MetaValue::from(vec!["test first"])
        );
        assert!(doc.body.is_empty());
    }

    #[test]
    fn tolerates_crlf_and_byte_order_mark() {
        let doc = parse("a.md", "\u{feff}---\r\nname: A\r\n---\r\nBody\r\n").unwrap();
        assert_eq!(doc.metadata["name"], MetaValue::from("A"));
        assert_eq!(doc.body.text(), "Body");
    }

    #[test]
    fn marker_line_becomes_marker_block() {
        let doc = parse("a.md", "---\n---\nintro\n{{ parent }}\noutro").unwrap();
        assert_eq!(
            doc.body.blocks(),
            &[
                BodyBlock::Text("intro".into()),
                BodyBlock::Marker(PARENT_MARKER.into()),
                BodyBlock::Text("outro".into()),
            ]
        );
    }

    #[test]
    fn fenced_and_unknown_markers_stay_text() {
        let doc = parse(
            "a.md",
            "---\n---\n```\n{{parent}}\n```\n{{unknown}}\n",
        )
        .unwrap();
        assert!(!doc.body.has_marker(PARENT_MARKER));
    }

    // ── parse errors ──────────────────────────────────────────────────────

    #[test]
    fn missing_opening_delimiter_is_malformed() {
        let err = parse("a.md", "name: A\n---\nbody").unwrap_err();
        assert!(matches!(err, DomainError::MalformedFrontmatter { .. }));
        assert!(err.to_string().starts_with("a.md"));
    }

    #[test]
    fn missing_closing_delimiter_is_malformed() {
        let err = parse("a.md", "---\nname: A\nbody").unwrap_err();
        assert!(err.to_string().contains("closing"));
    }

    #[test]
    fn invalid_yaml_is_malformed() {
        let err = parse("a.md", "---\nname: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, DomainError::MalformedFrontmatter { .. }));
    }

    #[test]
    fn scalar_frontmatter_is_invalid_metadata() {
        let err = parse("a.md", "---\njust a string\n---\n").unwrap_err();
        assert!(matches!(err, DomainError::InvalidMetadata { .. }));
    }

    #[test]
    fn non_string_key_is_invalid_metadata() {
        let err = parse("a.md", "---\n1: one\n---\n").unwrap_err();
        assert!(matches!(err, DomainError::InvalidMetadata { .. }));
    }

    #[test]
    fn duplicate_top_level_key_is_rejected() {
        let err = parse("a.md", "---\nname: A\nname: B\n---\n").unwrap_err();
        assert_eq!(
            err,
            DomainError::DuplicateKey {
                source_path: "a.md".into(),
                key: "name".into()
            }
        );
    }

    #[test]
    fn union_list_given_scalar_is_shape_conflict() {
        let err = parse("a.md", "---\nskills: pytest\n---\n").unwrap_err();
        match err {
            DomainError::ShapeConflict {
                field,
                expected,
                found,
                ..
            } => {
                assert_eq!(field, "skills");
                assert_eq!(expected, ValueKind::List);
                assert_eq!(found, "text");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nested_shape_conflicts_name_the_full_field() {
        let err = parse("a.md", "---\nknowledge:\n  constraints: none\n---\n").unwrap_err();
        assert!(matches!(
            err,
            DomainError::ShapeConflict { ref field, .. } if field == "knowledge.constraints"
        ));

        let err = parse("a.md", "---\nknowledge: [a]\n---\n").unwrap_err();
        assert!(matches!(
            err,
            DomainError::ShapeConflict {
                expected: ValueKind::Map,
                ..
            }
        ));
    }

    #[test]
    fn null_values_skip_shape_checks() {
        let doc = parse("a.md", "---\nskills: ~\n---\n").unwrap();
        assert!(doc.metadata["skills"].is_null());
    }

    #[test]
    fn repeated_parent_marker_is_rejected() {
        let err = parse("a.md", "---\n---\n{{parent}}\nmiddle\n{{parent}}\n").unwrap_err();
        assert!(matches!(err, DomainError::DuplicateMarker { .. }));
    }
}
