//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "stratum",
    bin_name = "stratum",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Flatten hierarchical agent templates into standalone documents",
    long_about = "Stratum resolves BASE-AGENT.md inheritance chains in a template \
                  corpus and writes one self-contained document per leaf.",
    after_help = "EXAMPLES:\n\
        \x20 stratum build --all\n\
        \x20 stratum build engineer/python --output-dir dist\n\
        \x20 stratum build --validate --strict\n\
        \x20 stratum list --type engineer",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Flatten the corpus (or one document) into the output directory.
    #[command(
        visible_alias = "b",
        about = "Build flattened documents",
        after_help = "EXAMPLES:\n\
            \x20 stratum build --all\n\
            \x20 stratum build python-engineer\n\
            \x20 stratum build --validate --lenient-refs\n\
            \x20 stratum build --corpus ./templates --output-dir ./dist --jobs 4"
    )]
    Build(BuildArgs),

    /// List the documents of the corpus.
    #[command(
        visible_alias = "ls",
        about = "List corpus documents",
        after_help = "EXAMPLES:\n\
            \x20 stratum list\n\
            \x20 stratum list --type qa\n\
            \x20 stratum list --format json"
    )]
    List(ListArgs),

    /// Create a starter corpus and a local configuration file.
    #[command(
        about = "Initialise a corpus and configuration",
        after_help = "EXAMPLES:\n\
            \x20 stratum init\n\
            \x20 stratum init --force"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 stratum completions bash > ~/.local/share/bash-completion/completions/stratum\n\
            \x20 stratum completions zsh  > ~/.zfunc/_stratum\n\
            \x20 stratum completions fish > ~/.config/fish/completions/stratum.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the active configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 stratum config get build.corpus_dir\n\
            \x20 stratum config list\n\
            \x20 stratum config path"
    )]
    Config(ConfigCommands),
}

// ── build ─────────────────────────────────────────────────────────────────────

/// Arguments for `stratum build`.
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Leaf to build, by path (`engineer/python`), name, or agent_id.
    #[arg(value_name = "DOCUMENT", conflicts_with = "all")]
    pub document: Option<String>,

    /// Build every leaf (the default when no document is named).
    #[arg(long = "all", help = "Build every document")]
    pub all: bool,

    /// Output root; overrides `build.output_dir`.
    #[arg(
        short = 'o',
        long = "output-dir",
        value_name = "DIR",
        conflicts_with = "validate",
        help = "Output directory"
    )]
    pub output_dir: Option<PathBuf>,

    /// Validate only; write nothing.
    #[arg(long = "validate", help = "Validate without writing output")]
    pub validate: bool,

    /// Stop at the first error and emit nothing.
    #[arg(long = "strict", help = "Abort on the first error")]
    pub strict: bool,

    /// Report unresolved cross-references as warnings.
    #[arg(
        long = "lenient-refs",
        help = "Downgrade unresolved references to warnings"
    )]
    pub lenient_refs: bool,

    /// Corpus root; overrides `build.corpus_dir`.
    #[arg(long = "corpus", value_name = "DIR", help = "Corpus directory")]
    pub corpus: Option<PathBuf>,

    /// Worker threads (0 = one per core).
    #[arg(short = 'j', long = "jobs", value_name = "N", help = "Worker threads")]
    pub jobs: Option<usize>,

    /// Omit `<!-- stratum:source ... -->` annotations.
    #[arg(long = "no-provenance", help = "Omit source annotations in bodies")]
    pub no_provenance: bool,
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `stratum list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only leaves whose resolved `agent_type` matches.
    #[arg(short = 't', long = "type", value_name = "TYPE", help = "Filter by agent type")]
    pub kind: Option<String>,

    /// Corpus root; overrides `build.corpus_dir`.
    #[arg(long = "corpus", value_name = "DIR", help = "Corpus directory")]
    pub corpus: Option<PathBuf>,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One path per line.
    List,
    /// JSON array.
    Json,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `stratum init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite files that already exist.
    #[arg(short = 'f', long = "force", help = "Overwrite existing files")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `stratum completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `stratum config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `build.jobs`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
