//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `stratum-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `CorpusSource`: Raw document files
//!   - `DocumentParser`: Metadata and body decoding
//!   - `DocumentRenderer`: Flattened document and manifest serialization
//!   - `Filesystem`: Output writes
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{CorpusSource, DocumentParser, DocumentRenderer, Filesystem, ManifestEntry};

#[cfg(test)]
pub use output::{MockCorpusSource, MockDocumentParser, MockDocumentRenderer, MockFilesystem};
