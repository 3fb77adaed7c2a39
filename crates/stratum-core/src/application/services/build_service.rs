//! Build Service - main application orchestrator.
//!
//! This service coordinates the flattening workflow:
//! 1. Parse the whole corpus and build the index (any failure aborts)
//! 2. Per leaf, in parallel: resolve, merge, compose, validate
//! 3. Corpus-wide validation once every leaf is done
//! 4. Render and write documents without errors, plus the manifest

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    application::{
        ApplicationError,
        ports::{CorpusSource, DocumentParser, DocumentRenderer, Filesystem, ManifestEntry},
        services::corpus_service::{find_leaf, load_index},
    },
    domain::{
        CorpusIndex, Diagnostic, DocIdx, DomainError, DomainValidator, FlattenedDocument,
        MergedLeaf, RelativePath, Schema, Severity, ValidationContext,
    },
    error::StratumResult,
};

/// File written next to the emitted documents.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Which leaves a build emits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    /// A single leaf, named by path, name, or identity value.
    One(String),
}

/// Per-invocation build settings.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub selection: Selection,
    /// Output root; `None` validates without writing.
    pub output_dir: Option<PathBuf>,
    /// Abort on the first error and emit nothing.
    pub strict: bool,
    pub lenient_references: bool,
    /// Worker threads; 0 lets the pool decide.
    pub jobs: usize,
    /// Prefix body segments with source annotations.
    pub provenance: bool,
    pub min_body_chars: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            selection: Selection::All,
            output_dir: None,
            strict: false,
            lenient_references: false,
            jobs: 0,
            provenance: true,
            min_body_chars: 50,
        }
    }
}

/// A leaf that was successfully flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltDocument {
    pub source: RelativePath,
    pub output: RelativePath,
    pub identity: Option<String>,
    pub emitted: bool,
}

/// Outcome of one build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Leaves in scope for this build.
    pub documents: usize,
    /// Sorted by location, then code, then message.
    pub diagnostics: Vec<Diagnostic>,
    pub built: Vec<BuiltDocument>,
    pub output_dir: Option<PathBuf>,
    /// Strict mode stopped the build.
    pub aborted: bool,
}

/// Overall result, worst severity first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Success,
    /// Validation errors were reported.
    Invalid,
    /// A leaf failed to resolve or merge.
    Failed,
}

impl BuildReport {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn emitted(&self) -> impl Iterator<Item = &BuiltDocument> {
        self.built.iter().filter(|b| b.emitted)
    }

    pub fn status(&self) -> BuildStatus {
        if self.errors().any(|d| d.code.is_fatal()) {
            BuildStatus::Failed
        } else if self.has_errors() {
            BuildStatus::Invalid
        } else {
            BuildStatus::Success
        }
    }
}

enum LeafOutcome {
    Built(FlattenedDocument, Vec<Diagnostic>),
    Failed(Diagnostic),
    Skipped,
}

/// Main build service.
pub struct BuildService {
    source: Box<dyn CorpusSource>,
    parser: Box<dyn DocumentParser>,
    renderer: Box<dyn DocumentRenderer>,
    filesystem: Box<dyn Filesystem>,
    schema: Schema,
}

impl BuildService {
    /// Create a new build service with the given adapters.
    pub fn new(
        source: Box<dyn CorpusSource>,
        parser: Box<dyn DocumentParser>,
        renderer: Box<dyn DocumentRenderer>,
        filesystem: Box<dyn Filesystem>,
        schema: Schema,
    ) -> Self {
        Self {
            source,
            parser,
            renderer,
            filesystem,
            schema,
        }
    }

    /// Run a build.
    ///
    /// Returns `Err` only for whole-build failures (parse, structural
    /// resolution, I/O, bad selection). Per-leaf failures and validation
    /// problems are diagnostics in the report.
    #[instrument(
        skip_all,
        fields(
            build_id = %Uuid::new_v4(),
            strict = options.strict,
            validate_only = options.output_dir.is_none()
        )
    )]
    pub fn build(&self, options: &BuildOptions) -> StratumResult<BuildReport> {
        if let Some(output) = &options.output_dir {
            self.check_output_dir(output)?;
        }

        // One pool for every parallel phase, parsing included.
        let pool = worker_pool(options.jobs)?;
        let index = pool.install(|| {
            load_index(self.source.as_ref(), self.parser.as_ref(), &self.schema)
        })?;
        let selected = match &options.selection {
            Selection::All => None,
            Selection::One(selector) => Some(find_leaf(&index, &self.schema, selector)?),
        };
        let in_scope = |idx: DocIdx| selected.is_none_or(|s| s == idx);

        info!(
            documents = index.len(),
            leaves = index.leaves().count(),
            "Corpus indexed"
        );

        // Per-leaf pass.
        let known = known_references(&index, &self.schema);
        let ctx = ValidationContext {
            schema: &self.schema,
            known_references: &known,
            lenient_references: options.lenient_references,
            min_body_chars: options.min_body_chars,
        };
        let cancel = AtomicBool::new(false);
        let leaves: Vec<DocIdx> = index.leaves().map(|(idx, _)| idx).collect();
        let outcomes: Vec<(DocIdx, LeafOutcome)> = pool.install(|| {
            leaves
                .par_iter()
                .map(|&idx| {
                    let stop_on_error = options.strict && in_scope(idx);
                    (idx, self.build_leaf(&index, idx, &ctx, stop_on_error, &cancel))
                })
                .collect()
        });

        // Barrier: corpus-wide pass over everything that merged.
        let mut diagnostics = Vec::new();
        let mut flattened = Vec::new();
        for (idx, outcome) in outcomes {
            match outcome {
                LeafOutcome::Built(doc, found) => {
                    diagnostics.extend(found);
                    flattened.push((idx, doc));
                }
                LeafOutcome::Failed(diagnostic) => diagnostics.push(diagnostic),
                LeafOutcome::Skipped => {}
            }
        }

        let mut aborted = cancel.load(Ordering::SeqCst);
        if !aborted {
            let locations: Vec<String> = flattened
                .iter()
                .map(|(idx, _)| index.document(*idx).location())
                .collect();
            let merged: Vec<MergedLeaf<'_>> = flattened
                .iter()
                .zip(&locations)
                .map(|((_, doc), location)| MergedLeaf {
                    location,
                    metadata: &doc.metadata,
                })
                .collect();
            diagnostics.extend(DomainValidator::validate_corpus(
                &self.schema,
                &index,
                &merged,
            ));
        }

        // Single-document builds only report on the chosen document.
        if let Some(idx) = selected {
            let location = index.document(idx).location();
            diagnostics.retain(|d| d.concerns(&location));
            flattened.retain(|(i, _)| *i == idx);
        }
        diagnostics.sort();

        if options.strict && diagnostics.iter().any(Diagnostic::is_error) {
            aborted = true;
        }
        if aborted {
            warn!("Strict build stopped at the first error; nothing emitted");
        }

        let mut report = BuildReport {
            documents: if selected.is_some() { 1 } else { leaves.len() },
            diagnostics,
            built: Vec::new(),
            output_dir: options.output_dir.clone(),
            aborted,
        };

        let mut to_emit = Vec::new();
        for (_, doc) in flattened {
            let source = doc.source.to_string();
            let emittable = !aborted
                && options.output_dir.is_some()
                && !report.errors().any(|d| d.concerns(&source));
            report.built.push(BuiltDocument {
                source: doc.source.clone(),
                output: doc.output_path()?,
                identity: doc.identity.clone(),
                emitted: emittable,
            });
            if emittable {
                to_emit.push(doc);
            }
        }

        if let Some(output) = options.output_dir.as_ref().filter(|_| !aborted) {
            self.emit(&pool, output, &to_emit, options.provenance)?;
        }

        info!(
            built = report.built.len(),
            emitted = report.emitted().count(),
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            "Build finished"
        );
        Ok(report)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn build_leaf(
        &self,
        index: &CorpusIndex,
        idx: DocIdx,
        ctx: &ValidationContext<'_>,
        stop_on_error: bool,
        cancel: &AtomicBool,
    ) -> LeafOutcome {
        if cancel.load(Ordering::SeqCst) {
            return LeafOutcome::Skipped;
        }

        let leaf = index.document(idx);
        let location = leaf.location();
        let fail = |err: DomainError| {
            if stop_on_error {
                cancel.store(true, Ordering::SeqCst);
            }
            debug!(document = %location, error = %err, "Leaf failed");
            LeafOutcome::Failed(Diagnostic::from_leaf_failure(location.clone(), &err))
        };

        let chain = match index.chain_for(idx) {
            Ok(chain) => chain,
            Err(err) => return fail(err),
        };
        let metadata = match chain.merge_metadata(&self.schema) {
            Ok(metadata) => metadata,
            Err(err) => return fail(err),
        };
        let body = chain.compose_body();

        let diagnostics = DomainValidator::validate_document(ctx, &location, &metadata, &body);
        if stop_on_error && diagnostics.iter().any(Diagnostic::is_error) {
            cancel.store(true, Ordering::SeqCst);
        }

        debug!(
            document = %location,
            chain = %chain.describe(),
            diagnostics = diagnostics.len(),
            "Leaf flattened"
        );

        let identity = self
            .schema
            .identity_fields()
            .find_map(|f| metadata.get(&f.name))
            .map(ToString::to_string);

        LeafOutcome::Built(
            FlattenedDocument {
                source: leaf.source.clone(),
                path: leaf.path(),
                identity,
                metadata,
                body,
            },
            diagnostics,
        )
    }

    /// Refuse an output root inside the corpus root.
    fn check_output_dir(&self, output: &Path) -> StratumResult<()> {
        let Some(corpus) = self.source.root() else {
            return Ok(());
        };

        let absolute = |p: &Path| {
            std::path::absolute(p).map_err(|e| ApplicationError::FilesystemError {
                path: p.to_path_buf(),
                reason: e.to_string(),
            })
        };
        let output_abs = absolute(output)?;
        let corpus_abs = absolute(&corpus)?;

        if output_abs.starts_with(&corpus_abs) {
            return Err(ApplicationError::OutputInsideCorpus {
                output: output.to_path_buf(),
                corpus,
            }
            .into());
        }
        Ok(())
    }

    /// Render and write every document in parallel, then the manifest.
    fn emit(
        &self,
        pool: &ThreadPool,
        output: &Path,
        documents: &[FlattenedDocument],
        provenance: bool,
    ) -> StratumResult<()> {
        self.filesystem.create_dir_all(output)?;

        let written: Vec<StratumResult<ManifestEntry>> = pool.install(|| {
            documents
                .par_iter()
                .map(|doc| -> StratumResult<ManifestEntry> {
                    let relative = doc.output_path()?;
                    let content = self.renderer.render(doc, &self.schema, provenance)?;
                    let path = output.join(relative.as_path());
                    if let Some(parent) = path.parent() {
                        self.filesystem.create_dir_all(parent)?;
                    }
                    self.filesystem.write_file(&path, &content)?;
                    Ok(ManifestEntry {
                        output: relative,
                        source: doc.source.clone(),
                        identity: doc.identity.clone(),
                        content,
                    })
                })
                .collect()
        });

        let mut entries = written.into_iter().collect::<StratumResult<Vec<_>>>()?;
        entries.sort_by(|a, b| a.output.cmp(&b.output));

        let manifest = self.renderer.render_manifest(&entries)?;
        self.filesystem
            .write_file(&output.join(MANIFEST_FILE), &manifest)?;

        info!(
            output = %output.display(),
            files = entries.len(),
            "Documents written"
        );
        Ok(())
    }
}

fn worker_pool(jobs: usize) -> StratumResult<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| {
            ApplicationError::WorkerPool {
                reason: e.to_string(),
            }
            .into()
        })
}

/// Every name a cross-reference may use: identity values, full paths, and
/// leaf names.
fn known_references(index: &CorpusIndex, schema: &Schema) -> BTreeSet<String> {
    let mut known = BTreeSet::new();
    for (_, leaf) in index.leaves() {
        known.insert(leaf.path().as_slash_path());
        known.insert(leaf.name.clone());
        for field in schema.identity_fields() {
            if let Some(value) = leaf.metadata.get(&field.name).filter(|v| !v.is_empty()) {
                known.insert(value.to_string());
            }
        }
    }
    known
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        MockCorpusSource, MockDocumentParser, MockDocumentRenderer, MockFilesystem,
    };
    use crate::domain::entities::corpus::tests::doc;
    use crate::domain::{DiagnosticCode, Document, MetaValue, RawDocument};
    use crate::error::StratumError;

    const BODY: &str = "A body that is comfortably longer than the fifty character minimum.";

    fn agent(path: &str, agent_id: &str, extra: &[(&str, MetaValue)]) -> Document {
        let mut meta: Vec<(&str, MetaValue)> = vec![
            ("name", "Agent".into()),
            ("description", "Does things".into()),
            ("agent_id", agent_id.into()),
            ("agent_type", "engineer".into()),
            ("skills", vec!["testing"].into()),
        ];
        meta.extend(extra.iter().cloned());
        doc(path, &meta, BODY)
    }

    fn service(docs: Vec<Document>, filesystem: MockFilesystem) -> BuildService {
        let raws: Vec<RawDocument> = docs
            .iter()
            .map(|d| RawDocument::new(d.source.clone(), ""))
            .collect();

        let mut source = MockCorpusSource::new();
        source.expect_load().returning(move || Ok(raws.clone()));
        source
            .expect_root()
            .returning(|| Some(PathBuf::from("/corpus")));

        let mut parser = MockDocumentParser::new();
        parser.expect_parse().returning(move |raw, _| {
            Ok(docs
                .iter()
                .find(|d| d.source == raw.relative_path)
                .cloned()
                .expect("document registered"))
        });

        let mut renderer = MockDocumentRenderer::new();
        renderer
            .expect_render()
            .returning(|doc, _, _| Ok(format!("{}\n", doc.body.plain())));
        renderer.expect_render_manifest().returning(|entries| {
            Ok(entries
                .iter()
                .map(|e| e.output.to_string())
                .collect::<Vec<_>>()
                .join("\n"))
        });

        BuildService::new(
            Box::new(source),
            Box::new(parser),
            Box::new(renderer),
            Box::new(filesystem),
            Schema::agent(),
        )
    }

    fn writing(expected: &'static [&'static str]) -> MockFilesystem {
        let mut fs = MockFilesystem::new();
        fs.expect_create_dir_all().returning(|_| Ok(()));
        for file in expected {
            fs.expect_write_file()
                .withf(move |path, _| path.ends_with(file))
                .times(1)
                .returning(|_, _| Ok(()));
        }
        fs
    }

    fn emit_to(dir: &str) -> BuildOptions {
        BuildOptions {
            output_dir: Some(PathBuf::from(dir)),
            ..BuildOptions::default()
        }
    }

    #[test]
    fn parsing_runs_on_the_configured_pool() {
        use std::sync::{Arc, Mutex};

        let doc = agent("qa/api.md", "api-qa", &[]);
        let raw = RawDocument::new(doc.source.clone(), "");

        let mut source = MockCorpusSource::new();
        source.expect_load().returning(move || Ok(vec![raw.clone()]));
        source.expect_root().returning(|| None);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let mut parser = MockDocumentParser::new();
        parser.expect_parse().returning(move |_, _| {
            recorder.lock().unwrap().push(rayon::current_num_threads());
            Ok(doc.clone())
        });

        let service = BuildService::new(
            Box::new(source),
            Box::new(parser),
            Box::new(MockDocumentRenderer::new()),
            Box::new(MockFilesystem::new()),
            Schema::agent(),
        );
        service
            .build(&BuildOptions {
                jobs: 3,
                ..BuildOptions::default()
            })
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[test]
    fn validate_only_reports_without_writing() {
        let service = service(
            vec![
                agent("engineer/python.md", "python-engineer", &[]),
                agent("ops/python.md", "python-engineer", &[]),
            ],
            MockFilesystem::new(),
        );

        let report = service.build(&BuildOptions::default()).unwrap();
        let duplicates: Vec<_> = report
            .errors()
            .filter(|d| d.code == DiagnosticCode::DuplicateIdentity)
            .collect();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(
            duplicates[0].locations,
            vec!["engineer/python.md", "ops/python.md"]
        );
        assert_eq!(report.status(), BuildStatus::Invalid);
        assert_eq!(report.emitted().count(), 0);
    }

    #[test]
    fn lenient_build_emits_only_unaffected_documents() {
        let service = service(
            vec![
                agent("engineer/python.md", "python-engineer", &[]),
                agent("ops/python.md", "python-engineer", &[]),
                agent("qa/api.md", "api-qa", &[]),
            ],
            writing(&["qa/api.md", "manifest.json"]),
        );

        let report = service.build(&emit_to("/out")).unwrap();
        let emitted: Vec<_> = report.emitted().map(|b| b.output.to_string()).collect();
        assert_eq!(emitted, vec!["qa/api.md"]);
        assert_eq!(report.built.len(), 3);
        assert!(!report.aborted);
    }

    #[test]
    fn strict_build_with_duplicate_identity_emits_nothing() {
        let service = service(
            vec![
                agent("engineer/python.md", "python-engineer", &[]),
                agent("ops/python.md", "python-engineer", &[]),
                agent("qa/api.md", "api-qa", &[]),
            ],
            MockFilesystem::new(),
        );

        let options = BuildOptions {
            strict: true,
            ..emit_to("/out")
        };
        let report = service.build(&options).unwrap();
        assert!(report.aborted);
        assert_eq!(report.emitted().count(), 0);
        assert_eq!(report.status(), BuildStatus::Invalid);
    }

    #[test]
    fn merge_failure_is_fatal_for_that_leaf_only() {
        let service = service(
            vec![
                agent("bad.md", "bad", &[("temperature", "hot".into())]),
                agent("good.md", "good", &[]),
            ],
            writing(&["good.md", "manifest.json"]),
        );

        let report = service.build(&emit_to("/out")).unwrap();
        assert_eq!(report.status(), BuildStatus::Failed);
        let failure = report.errors().next().unwrap();
        assert_eq!(failure.code, DiagnosticCode::Merge);
        assert_eq!(failure.primary_location(), "bad.md");
        assert_eq!(report.emitted().count(), 1);
    }

    #[test]
    fn warnings_do_not_block_emission() {
        let service = service(
            vec![
                agent("good.md", "good", &[]),
                doc("unused/BASE-AGENT.md", &[], ""),
            ],
            writing(&["good.md", "manifest.json"]),
        );

        let report = service.build(&emit_to("/out")).unwrap();
        assert_eq!(report.status(), BuildStatus::Success);
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(report.emitted().count(), 1);
    }

    #[test]
    fn refuses_output_inside_corpus() {
        let service = service(vec![agent("a.md", "a", &[])], MockFilesystem::new());

        let err = service.build(&emit_to("/corpus/out")).unwrap_err();
        assert!(matches!(
            err,
            StratumError::Application(ApplicationError::OutputInsideCorpus { .. })
        ));
    }

    #[test]
    fn single_document_build_reports_only_that_document() {
        let service = service(
            vec![
                agent("engineer/python.md", "python-engineer", &[]),
                agent("qa/api.md", "api-qa", &[("agent_type", "wizard".into())]),
            ],
            writing(&["engineer/python.md", "manifest.json"]),
        );

        let options = BuildOptions {
            selection: Selection::One("python-engineer".into()),
            ..emit_to("/out")
        };
        let report = service.build(&options).unwrap();
        assert_eq!(report.documents, 1);
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.built.len(), 1);
        assert!(report.built[0].emitted);
    }

    #[test]
    fn unknown_selection_is_an_error() {
        let service = service(vec![agent("a.md", "a", &[])], MockFilesystem::new());
        let options = BuildOptions {
            selection: Selection::One("ghost".into()),
            ..BuildOptions::default()
        };
        assert!(matches!(
            service.build(&options),
            Err(StratumError::Application(ApplicationError::DocumentNotFound { .. }))
        ));
    }

    #[test]
    fn base_cycle_aborts_before_output() {
        let service = service(
            vec![
                doc("a/BASE-AGENT.md", &[("extends", "a/b".into())], ""),
                doc("a/b/BASE-AGENT.md", &[], ""),
                agent("a/b/leaf.md", "leaf", &[]),
            ],
            MockFilesystem::new(),
        );

        let err = service.build(&emit_to("/out")).unwrap_err();
        assert!(matches!(err, StratumError::Domain(DomainError::Cycle { .. })));
    }

    #[test]
    fn handoff_to_unknown_agent_respects_leniency() {
        let interactions = MetaValue::Map(
            [("handoff_to".to_string(), vec!["ghost"].into())]
                .into_iter()
                .collect(),
        );
        let docs = vec![agent("a.md", "a", &[("interactions", interactions)])];

        let strict_refs = service(docs.clone(), MockFilesystem::new())
            .build(&BuildOptions::default())
            .unwrap();
        assert_eq!(strict_refs.status(), BuildStatus::Invalid);

        let lenient = service(docs, MockFilesystem::new())
            .build(&BuildOptions {
                lenient_references: true,
                ..BuildOptions::default()
            })
            .unwrap();
        assert_eq!(lenient.status(), BuildStatus::Success);
        assert_eq!(lenient.warnings().count(), 1);
    }

    #[test]
    fn report_serializes_for_machine_output() {
        let service = service(vec![agent("a.md", "a", &[])], MockFilesystem::new());
        let report = service.build(&BuildOptions::default()).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["documents"], 1);
        assert_eq!(json["built"][0]["output"], "a.md");
    }
}
