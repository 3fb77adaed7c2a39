//! In-memory corpus source for tests and embedded corpora.

use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{Arc, RwLock},
};

use stratum_core::{
    application::{ApplicationError, ports::CorpusSource},
    domain::{RawDocument, RelativePath},
    error::StratumResult,
};

/// Thread-safe corpus held in memory, keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpusSource {
    inner: Arc<RwLock<BTreeMap<RelativePath, String>>>,
}

impl InMemoryCorpusSource {
    /// Create an empty corpus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a corpus from `(path, text)` pairs.
    pub fn from_files<I, P, T>(files: I) -> StratumResult<Self>
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<PathBuf>,
        T: Into<String>,
    {
        let source = Self::new();
        for (path, text) in files {
            source.insert(path, text)?;
        }
        Ok(source)
    }

    /// Add or replace one file.
    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) -> StratumResult<()> {
        let path = RelativePath::try_new(path)?;
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        inner.insert(path, text.into());
        Ok(())
    }

    /// Remove one file, if present.
    pub fn remove(&self, path: impl Into<PathBuf>) -> StratumResult<()> {
        let path = RelativePath::try_new(path)?;
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        inner.remove(&path);
        Ok(())
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CorpusSource for InMemoryCorpusSource {
    fn root(&self) -> Option<PathBuf> {
        None
    }

    fn load(&self) -> StratumResult<Vec<RawDocument>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;

        Ok(inner
            .iter()
            .map(|(path, text)| RawDocument::new(path.clone(), text.clone()))
            .collect())
    }
}
