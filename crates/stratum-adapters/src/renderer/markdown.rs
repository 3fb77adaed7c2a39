//! Markdown renderer: YAML frontmatter in canonical order plus composed body.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use sha2::{Digest, Sha256};
use tracing::instrument;

use stratum_core::{
    application::{
        ApplicationError,
        ports::{DocumentRenderer, ManifestEntry},
    },
    domain::{FieldSpec, FlattenedDocument, MetaValue, Schema, canonical_position, find_field},
    error::StratumResult,
};

/// Manifest layout version, bumped when fields change meaning.
const MANIFEST_VERSION: u32 = 1;

/// Renders flattened documents in the same `---` frontmatter format the
/// loader reads, so output can be fed back in as a corpus.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    /// Create a new markdown renderer.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for MarkdownRenderer {
    #[instrument(skip_all, fields(document = %document.path))]
    fn render(
        &self,
        document: &FlattenedDocument,
        schema: &Schema,
        provenance: bool,
    ) -> StratumResult<String> {
        let front = ordered(&document.metadata, schema.fields());
        let yaml = if front.is_empty() {
            String::new()
        } else {
            serde_yaml::to_string(&Value::Mapping(front)).map_err(|e| {
                ApplicationError::RenderingFailed {
                    document: document.source.to_string(),
                    reason: e.to_string(),
                }
            })?
        };

        let body = document.body.render(provenance);

        let mut out = String::with_capacity(yaml.len() + body.len() + 16);
        out.push_str("---\n");
        out.push_str(&yaml);
        out.push_str("---\n");
        if !body.is_empty() {
            out.push('\n');
            out.push_str(&body);
            out.push('\n');
        }
        Ok(out)
    }

    fn render_manifest(&self, entries: &[ManifestEntry]) -> StratumResult<String> {
        let mut documents: Vec<ManifestDocument<'_>> = entries
            .iter()
            .map(|entry| ManifestDocument {
                output: entry.output.to_string(),
                source: entry.source.to_string(),
                identity: entry.identity.as_deref(),
                sha256: format!("{:x}", Sha256::digest(entry.content.as_bytes())),
            })
            .collect();
        documents.sort_by(|a, b| a.output.cmp(&b.output));

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            documents,
        };

        let mut json = serde_json::to_string_pretty(&manifest).map_err(|e| {
            ApplicationError::RenderingFailed {
                document: "manifest".into(),
                reason: e.to_string(),
            }
        })?;
        json.push('\n');
        Ok(json)
    }
}

#[derive(Serialize)]
struct Manifest<'a> {
    version: u32,
    documents: Vec<ManifestDocument<'a>>,
}

#[derive(Serialize)]
struct ManifestDocument<'a> {
    output: String,
    source: String,
    identity: Option<&'a str>,
    sha256: String,
}

/// Declared keys in schema order, then undeclared keys alphabetically.
fn ordered(map: &BTreeMap<String, MetaValue>, fields: &[FieldSpec]) -> Mapping {
    // BTreeMap iteration is alphabetical; the stable sort keeps that order
    // among undeclared keys.
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_by_key(|key| canonical_position(fields, key));

    let mut mapping = Mapping::new();
    for key in keys {
        let sub_fields = find_field(fields, key).map_or(&[][..], |f| f.fields.as_slice());
        mapping.insert(Value::String(key.clone()), to_yaml(&map[key], sub_fields));
    }
    mapping
}

fn to_yaml(value: &MetaValue, fields: &[FieldSpec]) -> Value {
    match value {
        MetaValue::Null => Value::Null,
        MetaValue::Bool(b) => Value::Bool(*b),
        MetaValue::Int(i) => Value::Number((*i).into()),
        MetaValue::Float(x) => Value::Number((*x).into()),
        MetaValue::Str(s) => Value::String(s.clone()),
        MetaValue::List(items) => {
            Value::Sequence(items.iter().map(|v| to_yaml(v, &[])).collect())
        }
        MetaValue::Map(map) => Value::Mapping(ordered(map, fields)),
    }
}
