//! Stratum Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for Stratum, which
//! flattens hierarchical template documents into standalone artifacts.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           stratum-cli (CLI)             │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │     (BuildService, CorpusService)       │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │  (CorpusSource, DocumentParser,         │
//! │   DocumentRenderer, Filesystem)         │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    stratum-adapters (Infrastructure)    │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (CorpusIndex, AncestorChain, Validator) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stratum_core::prelude::*;
//!
//! let service = BuildService::new(source, parser, renderer, filesystem, Schema::agent());
//! let report = service.build(&BuildOptions {
//!     output_dir: Some("dist/agents".into()),
//!     ..BuildOptions::default()
//! })?;
//! assert!(!report.has_errors());
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        BuildOptions, BuildReport, BuildService, BuildStatus, CorpusService, DocumentInfo,
        Selection,
        ports::{CorpusSource, DocumentParser, DocumentRenderer, Filesystem, ManifestEntry},
    };
    pub use crate::domain::{
        CategoryPath, Diagnostic, DiagnosticCode, Document, FlattenedDocument, MetaValue, Metadata,
        RawDocument, RelativePath, Schema, Severity,
    };
    pub use crate::error::{StratumError, StratumResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
