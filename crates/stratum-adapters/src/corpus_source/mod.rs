//! Corpus source adapters.

mod local;
mod memory;

pub use local::FilesystemCorpusSource;
pub use memory::InMemoryCorpusSource;
