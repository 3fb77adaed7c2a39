//! Corpus Service - loading, lookup, and listing.
//!
//! Loading is shared with the build: the whole corpus is parsed before the
//! index is built, and any parse error aborts.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    application::{
        ApplicationError,
        ports::{CorpusSource, DocumentParser},
    },
    domain::{CorpusIndex, DocIdx, Document, DocumentRole, MetaValue, Schema},
    error::StratumResult,
};

/// Information about a document for display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    /// Category path, `/`-joined.
    pub path: String,
    pub name: String,
    pub role: DocumentRole,
    pub source: String,
    pub identity: Option<String>,
    pub description: Option<String>,
    /// `agent_type` after inheritance, when resolvable.
    pub kind: Option<String>,
    /// Number of documents in the ancestor chain, the document included.
    pub depth: usize,
}

/// Service for corpus queries.
pub struct CorpusService {
    source: Box<dyn CorpusSource>,
    parser: Box<dyn DocumentParser>,
    schema: Schema,
}

impl CorpusService {
    /// Create a new corpus service.
    pub fn new(
        source: Box<dyn CorpusSource>,
        parser: Box<dyn DocumentParser>,
        schema: Schema,
    ) -> Self {
        Self {
            source,
            parser,
            schema,
        }
    }

    /// Parse and index the whole corpus.
    pub fn load(&self) -> StratumResult<CorpusIndex> {
        load_index(self.source.as_ref(), self.parser.as_ref(), &self.schema)
    }

    /// List every document, bases first, each group in path order.
    #[instrument(skip_all)]
    pub fn list(&self) -> StratumResult<Vec<DocumentInfo>> {
        let index = self.load()?;

        let bases = index.bases().map(|(_, doc)| {
            let depth = index.base_chain(&doc.path()).map_or(1, <[DocIdx]>::len);
            info_for(&self.schema, doc, depth, text(doc.metadata.get("agent_type")))
        });

        let leaves = index.leaves().map(|(idx, doc)| {
            let (depth, kind) = match index.chain_for(idx) {
                Ok(chain) => {
                    let kind = chain
                        .merge_metadata(&self.schema)
                        .ok()
                        .and_then(|m| text(m.get("agent_type")));
                    (chain.len(), kind)
                }
                Err(_) => (1, text(doc.metadata.get("agent_type"))),
            };
            info_for(&self.schema, doc, depth, kind)
        });

        let infos: Vec<_> = bases.chain(leaves).collect();
        info!(count = infos.len(), "Listed corpus documents");
        Ok(infos)
    }

    /// Resolve a leaf by full path, name, or identity value.
    pub fn find(&self, index: &CorpusIndex, selector: &str) -> StratumResult<DocIdx> {
        find_leaf(index, &self.schema, selector)
    }
}

/// Parse every raw document, then build the index.
#[instrument(skip_all)]
pub(crate) fn load_index(
    source: &dyn CorpusSource,
    parser: &dyn DocumentParser,
    schema: &Schema,
) -> StratumResult<CorpusIndex> {
    let raws = source.load()?;
    debug!(files = raws.len(), "Corpus files loaded");

    // Collected in source order so the reported parse error is stable.
    let parsed: Vec<_> = raws.par_iter().map(|raw| parser.parse(raw, schema)).collect();
    let documents = parsed.into_iter().collect::<Result<Vec<Document>, _>>()?;

    Ok(CorpusIndex::build(documents)?)
}

/// Leaf lookup shared by `list`-style queries and single-document builds.
pub(crate) fn find_leaf(
    index: &CorpusIndex,
    schema: &Schema,
    selector: &str,
) -> StratumResult<DocIdx> {
    let by_path = crate::domain::CategoryPath::parse(selector.trim_end_matches(".md"))
        .ok()
        .and_then(|path| index.leaf_at(&path));
    if let Some(idx) = by_path {
        return Ok(idx);
    }

    let mut candidates: Vec<DocIdx> = index.leaves_named(selector).collect();
    for field in schema.identity_fields() {
        candidates.extend(index.leaves_with(&field.name, selector));
    }
    candidates.sort();
    candidates.dedup();

    match candidates.as_slice() {
        [] => Err(ApplicationError::DocumentNotFound {
            selector: selector.to_string(),
        }
        .into()),
        [only] => Ok(*only),
        many => Err(ApplicationError::AmbiguousSelection {
            selector: selector.to_string(),
            candidates: many
                .iter()
                .map(|&i| index.document(i).location())
                .collect(),
        }
        .into()),
    }
}

fn info_for(schema: &Schema, doc: &Document, depth: usize, kind: Option<String>) -> DocumentInfo {
    let identity = schema
        .identity_fields()
        .find_map(|f| text(doc.metadata.get(&f.name)));

    DocumentInfo {
        path: doc.path().as_slash_path(),
        name: doc.name.clone(),
        role: doc.role,
        source: doc.location(),
        identity,
        description: text(doc.metadata.get("description")),
        kind,
        depth,
    }
}

fn text(value: Option<&MetaValue>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(ToString::to_string)
}
