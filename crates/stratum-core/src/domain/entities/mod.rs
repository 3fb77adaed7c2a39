pub mod chain;
pub mod common;
pub mod compose;
pub mod corpus;
pub mod document;
pub mod flattened;
pub mod merge;

pub use crate::domain::DomainError;
pub use chain::AncestorChain;
pub use common::RelativePath;
pub use compose::{ComposedBody, Segment, Spacing};
pub use corpus::{CorpusIndex, DocIdx};
pub use document::{Body, BodyBlock, Document, MetaValue, Metadata, RawDocument};
pub use flattened::FlattenedDocument;
