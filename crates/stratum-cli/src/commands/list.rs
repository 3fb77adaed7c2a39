//! `stratum list`: show the documents of a corpus.

use stratum_adapters::{FilesystemCorpusSource, FrontmatterParser};
use stratum_core::{
    application::{CorpusService, DocumentInfo},
    domain::{DocumentRole, Schema},
};

use crate::{
    cli::{ListArgs, ListFormat},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(args: ListArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let corpus = args.corpus.unwrap_or(config.build.corpus_dir);
    let service = CorpusService::new(
        Box::new(FilesystemCorpusSource::new(corpus)),
        Box::new(FrontmatterParser::new()),
        Schema::agent(),
    );

    let documents = filter(service.list()?, args.kind.as_deref());

    if output.is_json() || args.format == ListFormat::Json {
        output.json(&documents)?;
        return Ok(());
    }

    match args.format {
        ListFormat::Table => {
            output.header(&format!(
                "{:<36} {:<5} {:<14} {}",
                "PATH", "ROLE", "TYPE", "AGENT_ID"
            ))?;
            for doc in &documents {
                let path: &str = if doc.path.is_empty() { "/" } else { &doc.path };
                output.print(&format!(
                    "{:<36} {:<5} {:<14} {}",
                    path,
                    doc.role.as_str(),
                    doc.kind.as_deref().unwrap_or("-"),
                    doc.identity.as_deref().unwrap_or("-"),
                ))?;
            }
        }
        ListFormat::List => {
            for doc in documents.iter().filter(|d| d.role == DocumentRole::Leaf) {
                output.print(&doc.path)?;
            }
        }
        ListFormat::Json => {}
    }

    Ok(())
}

/// Keep bases, and leaves whose resolved type matches.
fn filter(documents: Vec<DocumentInfo>, kind: Option<&str>) -> Vec<DocumentInfo> {
    let Some(kind) = kind else {
        return documents;
    };
    documents
        .into_iter()
        .filter(|d| d.role == DocumentRole::Base || d.kind.as_deref() == Some(kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(path: &str, role: DocumentRole, kind: Option<&str>) -> DocumentInfo {
        DocumentInfo {
            path: path.into(),
            name: path.rsplit('/').next().unwrap_or(path).into(),
            role,
            source: format!("{path}.md"),
            identity: None,
            description: None,
            kind: kind.map(Into::into),
            depth: 1,
        }
    }

    #[test]
    fn type_filter_keeps_bases_and_matching_leaves() {
        let docs = vec![
            info("engineer", DocumentRole::Base, None),
            info("engineer/python", DocumentRole::Leaf, Some("engineer")),
            info("qa/api", DocumentRole::Leaf, Some("qa")),
        ];

        let kept = filter(docs, Some("qa"));
        let paths: Vec<&str> = kept.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, ["engineer", "qa/api"]);
    }

    #[test]
    fn no_filter_keeps_everything() {
        let docs = vec![info("a", DocumentRole::Leaf, None)];
        assert_eq!(filter(docs, None).len(), 1);
    }
}
