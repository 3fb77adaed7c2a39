//! Arena of loaded documents indexed by category path.

use std::collections::BTreeMap;

use tracing::debug;

use super::document::Document;
use crate::domain::error::DomainError;
use crate::domain::value_objects::CategoryPath;

/// Index of a document in the corpus arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocIdx(usize);

impl DocIdx {
    pub fn get(self) -> usize {
        self.0
    }
}

/// Immutable, path-indexed view of one build's documents.
///
/// Built once per build; every structural failure surfaces here, before any
/// leaf is resolved. Base ancestry (including `extends` redirection) is
/// resolved for every base during construction, so cycles abort the build.
#[derive(Debug)]
pub struct CorpusIndex {
    documents: Vec<Document>,
    bases: BTreeMap<CategoryPath, DocIdx>,
    leaves: BTreeMap<CategoryPath, DocIdx>,
    /// Resolved base chain (root first) ending at the keyed base.
    base_chains: BTreeMap<CategoryPath, Vec<DocIdx>>,
}

impl CorpusIndex {
    pub fn build(documents: Vec<Document>) -> Result<Self, DomainError> {
        let mut bases: BTreeMap<CategoryPath, DocIdx> = BTreeMap::new();
        let mut leaves: BTreeMap<CategoryPath, DocIdx> = BTreeMap::new();

        for (i, doc) in documents.iter().enumerate() {
            check_declared_category(doc)?;

            let idx = DocIdx(i);
            let path = doc.path();
            let (map, base_role) = if doc.is_base() {
                (&mut bases, true)
            } else {
                (&mut leaves, false)
            };

            if let Some(existing) = map.insert(path.clone(), idx) {
                let first = documents[existing.0].location();
                let second = doc.location();
                return Err(if base_role {
                    DomainError::DuplicateBase {
                        path,
                        first,
                        second,
                    }
                } else {
                    DomainError::DuplicateLeaf {
                        path,
                        first,
                        second,
                    }
                });
            }
        }

        for (path, leaf) in &leaves {
            if let Some(base) = bases.get(path) {
                return Err(DomainError::LeafShadowsBase {
                    path: path.clone(),
                    leaf: documents[leaf.0].location(),
                    base: documents[base.0].location(),
                });
            }
        }

        let mut index = Self {
            documents,
            bases,
            leaves,
            base_chains: BTreeMap::new(),
        };
        index.resolve_base_chains()?;

        debug!(
            documents = index.documents.len(),
            bases = index.bases.len(),
            leaves = index.leaves.len(),
            "Corpus index built"
        );
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn document(&self, idx: DocIdx) -> &Document {
        &self.documents[idx.0]
    }

    /// Leaves in path order.
    pub fn leaves(&self) -> impl Iterator<Item = (DocIdx, &Document)> {
        self.leaves.values().map(|&idx| (idx, &self.documents[idx.0]))
    }

    /// Bases in path order.
    pub fn bases(&self) -> impl Iterator<Item = (DocIdx, &Document)> {
        self.bases.values().map(|&idx| (idx, &self.documents[idx.0]))
    }

    pub fn base_at(&self, path: &CategoryPath) -> Option<DocIdx> {
        self.bases.get(path).copied()
    }

    pub fn leaf_at(&self, path: &CategoryPath) -> Option<DocIdx> {
        self.leaves.get(path).copied()
    }

    /// Leaves whose name is `name`, in path order.
    pub fn leaves_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = DocIdx> + 'a {
        self.leaves()
            .filter(move |(_, doc)| doc.name == name)
            .map(|(idx, _)| idx)
    }

    /// Leaves whose top-level `key` equals `value`, in path order.
    pub fn leaves_with<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> impl Iterator<Item = DocIdx> + 'a {
        self.leaves()
            .filter(move |(_, doc)| {
                doc.metadata.get(key).and_then(|v| v.as_str()) == Some(value)
            })
            .map(|(idx, _)| idx)
    }

    /// Nearest base strictly above `path` on its natural prefixes.
    pub fn nearest_base_above(&self, path: &CategoryPath) -> Option<&CategoryPath> {
        path.strict_prefixes()
            .find_map(|prefix| self.bases.get_key_value(&prefix).map(|(k, _)| k))
    }

    /// Resolved chain for the base at `path`, root first.
    pub fn base_chain(&self, path: &CategoryPath) -> Option<&[DocIdx]> {
        self.base_chains.get(path).map(Vec::as_slice)
    }

    /// Number of documents whose resolved ancestry includes `base`.
    pub fn descendants_of(&self, base: DocIdx) -> usize {
        let base_path = self.documents[base.0].path();

        let via_bases = self
            .base_chains
            .iter()
            .filter(|(path, chain)| **path != base_path && chain.contains(&base))
            .count();

        let via_leaves = self
            .leaves()
            .filter(|(_, leaf)| {
                self.upstream_path(leaf)
                    .and_then(|p| self.base_chains.get(&p))
                    .is_some_and(|chain| chain.contains(&base))
            })
            .count();

        via_bases + via_leaves
    }

    /// Path of the base a document's own chain continues from.
    pub(crate) fn upstream_path(&self, doc: &Document) -> Option<CategoryPath> {
        match doc.extends() {
            Some(target) => Some(target),
            None => self.nearest_base_above(&doc.path()).cloned(),
        }
    }

    fn resolve_base_chains(&mut self) -> Result<(), DomainError> {
        let paths: Vec<CategoryPath> = self.bases.keys().cloned().collect();
        let mut memo = BTreeMap::new();
        for path in &paths {
            let mut visiting = Vec::new();
            self.resolve_base(path, &mut visiting, &mut memo)?;
        }
        self.base_chains = memo;
        Ok(())
    }

    fn resolve_base(
        &self,
        path: &CategoryPath,
        visiting: &mut Vec<CategoryPath>,
        memo: &mut BTreeMap<CategoryPath, Vec<DocIdx>>,
    ) -> Result<Vec<DocIdx>, DomainError> {
        if let Some(chain) = memo.get(path) {
            return Ok(chain.clone());
        }
        if visiting.contains(path) {
            visiting.push(path.clone());
            return Err(cycle(visiting));
        }

        let Some(&idx) = self.bases.get(path) else {
            let source_path = visiting
                .last()
                .and_then(|p| self.bases.get(p))
                .map(|i| self.documents[i.0].location())
                .unwrap_or_default();
            return Err(DomainError::MissingAncestor {
                source_path,
                target: path.clone(),
            });
        };
        let doc = &self.documents[idx.0];

        visiting.push(path.clone());
        let upstream = match doc.extends() {
            Some(target) if target.starts_with(path) => {
                visiting.push(target);
                return Err(cycle(visiting));
            }
            Some(target) => self.resolve_base(&target, visiting, memo)?,
            None => match self.nearest_base_above(path).cloned() {
                Some(parent) => self.resolve_base(&parent, visiting, memo)?,
                None => Vec::new(),
            },
        };
        visiting.pop();

        let mut chain = upstream;
        chain.push(idx);
        memo.insert(path.clone(), chain.clone());
        Ok(chain)
    }
}

fn cycle(visiting: &[CategoryPath]) -> DomainError {
    DomainError::Cycle {
        chain: visiting
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> "),
    }
}

fn check_declared_category(doc: &Document) -> Result<(), DomainError> {
    let Some(declared) = doc.declared_category() else {
        return Ok(());
    };

    let consistent = if doc.is_base() {
        declared == doc.directory
    } else {
        doc.path().is_strict_descendant_of(&doc.directory)
    };

    if consistent {
        Ok(())
    } else {
        Err(DomainError::StructuralMismatch {
            source_path: doc.location(),
            declared,
            directory: doc.directory.clone(),
        })
    }
}
