//! `stratum build`: flatten the corpus into the output directory.

use std::path::PathBuf;

use stratum_adapters::{
    FilesystemCorpusSource, FrontmatterParser, LocalFilesystem, MarkdownRenderer,
};
use stratum_core::prelude::*;
use tracing::{debug, instrument};

use crate::{
    cli::BuildArgs,
    config::{AppConfig, BuildConfig},
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Run a build and translate its status into the exit code.
#[instrument(skip_all)]
pub fn execute(args: BuildArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let corpus = args
        .corpus
        .clone()
        .unwrap_or_else(|| config.build.corpus_dir.clone());
    let options = options_for(&args, &config.build);
    debug!(corpus = %corpus.display(), ?options, "Resolved build options");

    let service = BuildService::new(
        Box::new(FilesystemCorpusSource::new(&corpus)),
        Box::new(FrontmatterParser::new()),
        Box::new(MarkdownRenderer::new()),
        Box::new(LocalFilesystem::new()),
        Schema::agent(),
    );
    let report = service.build(&options)?;

    if output.is_json() {
        output.json(&report)?;
    } else {
        print_report(&report, &output)?;
    }

    match report.status() {
        BuildStatus::Success => Ok(()),
        BuildStatus::Invalid => Err(CliError::ValidationFailed {
            errors: report.errors().count(),
        }),
        BuildStatus::Failed => Err(CliError::BuildFailed {
            failures: report.errors().filter(|d| d.code.is_fatal()).count(),
        }),
    }
}

/// Merge flags over the `[build]` config section.
fn options_for(args: &BuildArgs, config: &BuildConfig) -> BuildOptions {
    let selection = match &args.document {
        Some(document) => Selection::One(document.clone()),
        None => Selection::All,
    };
    let output_dir: Option<PathBuf> = if args.validate {
        None
    } else {
        Some(
            args.output_dir
                .clone()
                .unwrap_or_else(|| config.output_dir.clone()),
        )
    };

    BuildOptions {
        selection,
        output_dir,
        strict: args.strict || config.strict,
        lenient_references: args.lenient_refs || config.lenient_references,
        jobs: args.jobs.unwrap_or(config.jobs),
        provenance: config.provenance && !args.no_provenance,
        min_body_chars: config.min_body_chars,
    }
}

fn print_report(report: &BuildReport, output: &OutputManager) -> CliResult<()> {
    for diagnostic in &report.diagnostics {
        output.diagnostic(diagnostic)?;
    }

    let errors = report.errors().count();
    let warnings = report.warnings().count();
    let counts = format!("{errors} error(s), {warnings} warning(s)");

    if report.aborted {
        output.error(&format!("Strict build stopped; nothing written ({counts})"))?;
        return Ok(());
    }

    match &report.output_dir {
        Some(dir) => {
            let emitted = report.emitted().count();
            let line = format!(
                "Wrote {emitted} of {} document(s) to {} ({counts})",
                report.documents,
                dir.display()
            );
            if errors == 0 {
                output.success(&line)?;
            } else {
                output.warning(&line)?;
            }
        }
        None => {
            let line = format!("Validated {} document(s) ({counts})", report.documents);
            if errors == 0 {
                output.success(&line)?;
            } else {
                output.warning(&line)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    fn build_args(argv: &[&str]) -> BuildArgs {
        let cli = Cli::parse_from(std::iter::once("stratum").chain(argv.iter().copied()));
        match cli.command {
            Commands::Build(args) => args,
            other => panic!("expected Build, got {other:?}"),
        }
    }

    #[test]
    fn config_supplies_defaults() {
        let config = BuildConfig {
            strict: true,
            jobs: 3,
            ..BuildConfig::default()
        };

        let options = options_for(&build_args(&["build"]), &config);
        assert_eq!(options.selection, Selection::All);
        assert_eq!(options.output_dir, Some(PathBuf::from("dist")));
        assert!(options.strict);
        assert_eq!(options.jobs, 3);
        assert!(options.provenance);
    }

    #[test]
    fn flags_override_config() {
        let options = options_for(
            &build_args(&["build", "python", "-o", "out", "-j", "2", "--no-provenance"]),
            &BuildConfig::default(),
        );
        assert_eq!(options.selection, Selection::One("python".into()));
        assert_eq!(options.output_dir, Some(PathBuf::from("out")));
        assert_eq!(options.jobs, 2);
        assert!(!options.provenance);
    }

    #[test]
    fn validate_writes_nothing() {
        let options = options_for(&build_args(&["build", "--validate"]), &BuildConfig::default());
        assert_eq!(options.output_dir, None);
    }
}
