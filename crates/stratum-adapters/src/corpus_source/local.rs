//! Directory-walking corpus source.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument};
use walkdir::{DirEntry, WalkDir};

use stratum_core::{
    application::{ApplicationError, ports::CorpusSource},
    domain::{RawDocument, RelativePath},
    error::StratumResult,
};

/// Reads every `*.md` file below a corpus root.
///
/// Hidden directories (`.git`, `.stratum`, ...) are skipped. Files are
/// returned sorted by relative path so that parse errors and diagnostics are
/// stable across platforms.
#[derive(Debug, Clone)]
pub struct FilesystemCorpusSource {
    root: PathBuf,
}

impl FilesystemCorpusSource {
    /// Create a source rooted at `root`. The directory is checked on load.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl CorpusSource for FilesystemCorpusSource {
    fn root(&self) -> Option<PathBuf> {
        Some(self.root.clone())
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    fn load(&self) -> StratumResult<Vec<RawDocument>> {
        if !self.root.is_dir() {
            return Err(ApplicationError::CorpusNotFound {
                path: self.root.clone(),
            }
            .into());
        }

        let mut documents = Vec::new();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = entry.map_err(|e| ApplicationError::FilesystemError {
                path: e.path().unwrap_or(&self.root).to_path_buf(),
                reason: format!("Failed to walk corpus: {e}"),
            })?;

            if !entry.file_type().is_file() || !is_markdown(entry.path()) {
                continue;
            }

            let relative = entry.path().strip_prefix(&self.root).map_err(|_| {
                ApplicationError::FilesystemError {
                    path: entry.path().to_path_buf(),
                    reason: "File lies outside the corpus root".into(),
                }
            })?;

            let text =
                fs::read_to_string(entry.path()).map_err(|e| ApplicationError::FilesystemError {
                    path: entry.path().to_path_buf(),
                    reason: format!("Failed to read file: {e}"),
                })?;

            documents.push(RawDocument::new(RelativePath::try_new(relative)?, text));
        }

        documents.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        debug!(count = documents.len(), "read corpus files");
        Ok(documents)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}
