//! Inheritance resolution: the root-to-leaf chain of a leaf document.

use super::corpus::{CorpusIndex, DocIdx};
use super::document::Document;
use crate::domain::error::DomainError;

/// Ordered ancestor chain, root first, ending with the leaf itself.
#[derive(Debug, Clone)]
pub struct AncestorChain<'a> {
    members: Vec<&'a Document>,
}

impl<'a> AncestorChain<'a> {
    pub fn new(members: Vec<&'a Document>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[&'a Document] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Final member; `None` only for an empty chain.
    pub fn leaf(&self) -> Option<&'a Document> {
        self.members.last().copied()
    }

    /// Human-readable `root -> ... -> leaf` rendering for logs.
    pub fn describe(&self) -> String {
        self.members
            .iter()
            .map(|d| d.location())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl CorpusIndex {
    /// Resolve the chain for a leaf.
    ///
    /// Bases on the leaf's natural prefixes contribute unless the leaf names
    /// another base with `extends`; a redirect to a missing base fails for
    /// this leaf only.
    pub fn chain_for(&self, leaf: DocIdx) -> Result<AncestorChain<'_>, DomainError> {
        let doc = self.document(leaf);

        let upstream: &[DocIdx] = match doc.extends() {
            Some(target) => {
                self.base_chain(&target)
                    .ok_or_else(|| DomainError::MissingAncestor {
                        source_path: doc.location(),
                        target,
                    })?
            }
            None => self
                .nearest_base_above(&doc.path())
                .and_then(|p| self.base_chain(p))
                .unwrap_or(&[]),
        };

        let mut members: Vec<&Document> = upstream.iter().map(|&i| self.document(i)).collect();
        members.push(doc);
        Ok(AncestorChain::new(members))
    }
}
