//! `stratum init`: write a local config file and a starter corpus.

use std::path::{Path, PathBuf};

use crate::{
    cli::InitArgs,
    config::{AppConfig, LOCAL_CONFIG_FILE},
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Starter corpus: a root base, one category base, and two leaves that hand
/// off to each other.
const STARTER_CORPUS: &[(&str, &str)] = &[
    (
        "BASE-AGENT.md",
        "---
version: 1.0.0
model: sonnet
temperature: 0.3
tags: [team]
knowledge:
  best_practices:
    - State assumptions before acting
---
You are one agent in a team of specialists. Read the task carefully, say
what you are about to do, and report exactly what you changed.
",
    ),
    (
        "engineer/BASE-AGENT.md",
        "---
agent_type: engineer
skills: [code-review]
knowledge:
  constraints:
    - Keep changes small and covered by tests
---
{{parent}}

As an engineer you write production code and the tests that cover it.
",
    ),
    (
        "engineer/python.md",
        "---
name: Python Engineer
description: Writes and reviews idiomatic, typed Python
agent_id: python-engineer
temperature: 0.2
skills: [pytest, mypy]
tags: [python]
interactions:
  handoff_to: [api-qa]
dependencies:
  python: [pytest, mypy]
---
Prefer type hints, small functions, and pytest fixtures over setup code.
",
    ),
    (
        "qa/api.md",
        "---
name: API QA
description: Tests HTTP APIs against their contracts
agent_id: api-qa
agent_type: qa
skills: [contract-testing]
interactions:
  handoff_to: [python-engineer]
---
Check every endpoint for status codes, schemas, and error bodies.
",
    ),
];

/// Create `stratum.toml` and the starter corpus under `build.corpus_dir`.
pub fn execute(args: InitArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    output.info("Initialising corpus and configuration...")?;

    let config_path = PathBuf::from(LOCAL_CONFIG_FILE);
    let corpus = config.build.corpus_dir.clone();

    let mut files: Vec<(PathBuf, String)> = STARTER_CORPUS
        .iter()
        .map(|(rel, text)| (corpus.join(rel), (*text).to_string()))
        .collect();
    files.push((config_path, config_toml(config)?));

    // Refuse before writing anything.
    if !args.force {
        if let Some((path, _)) = files.iter().find(|(path, _)| path.exists()) {
            return Err(CliError::AlreadyExists { path: path.clone() });
        }
    }

    for (path, text) in &files {
        write(path, text)?;
        output.print(&format!("  created {}", path.display()))?;
    }

    output.success(&format!(
        "Starter corpus written to {}; run `stratum build` next",
        corpus.display()
    ))?;
    Ok(())
}

/// The effective configuration as TOML.
fn config_toml(config: AppConfig) -> CliResult<String> {
    let config = AppConfig {
        source: None,
        ..config
    };
    toml::to_string_pretty(&config).map_err(|e| CliError::ConfigError {
        message: format!("Failed to serialise config: {e}"),
        source: Some(Box::new(e)),
    })
}

fn write(path: &Path, text: &str) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_cli_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }
    std::fs::write(path, text)
        .with_cli_context(|| format!("Failed to write '{}'", path.display()))
}
