//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `STRATUM_*` environment variables, `__` between nesting levels
//!    (`STRATUM_BUILD__JOBS=4`); `.env` is loaded first by `main`
//! 3. Config file: `--config FILE`, otherwise `./stratum.toml` over the
//!    per-user file
//! 4. Built-in defaults (always present)

use std::path::PathBuf;

use anyhow::{Context, bail};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Name of the project-local configuration file.
pub const LOCAL_CONFIG_FILE: &str = "stratum.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,
    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
    /// File the values came from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub corpus_dir: PathBuf,
    pub output_dir: PathBuf,
    pub strict: bool,
    pub lenient_references: bool,
    /// Worker threads; 0 means one per core.
    pub jobs: usize,
    pub provenance: bool,
    /// Composed bodies shorter than this draw a `thin-body` warning.
    pub min_body_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("agents"),
            output_dir: PathBuf::from("dist"),
            strict: false,
            lenient_references: false,
            jobs: 0,
            provenance: true,
            min_body_chars: 50,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "human".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, file, and environment.
    ///
    /// An explicit `config_file` must exist; the default locations are
    /// optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let defaults =
            Config::try_from(&Self::default()).context("Failed to encode default config")?;
        let mut builder = Config::builder().add_source(defaults);
        let mut source = None;

        match config_file {
            Some(path) => {
                if !path.is_file() {
                    bail!("config file not found: {}", path.display());
                }
                builder = builder.add_source(File::from(path.clone()).format(FileFormat::Toml));
                source = Some(path.clone());
            }
            None => {
                // Later files win.
                for candidate in [Self::config_path(), PathBuf::from(LOCAL_CONFIG_FILE)] {
                    if candidate.is_file() {
                        builder = builder
                            .add_source(File::from(candidate.clone()).format(FileFormat::Toml));
                        source = Some(candidate);
                    }
                }
            }
        }

        let mut config: Self = builder
            .add_source(
                Environment::with_prefix("STRATUM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.source = source;
        Ok(config)
    }

    /// Path to the per-user configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `stratum.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "stratum", "stratum")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// Look up a dotted key such as `build.jobs`.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut value = serde_json::to_value(self).ok()?;
        for part in key.split('.') {
            value = value.get_mut(part)?.take();
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_point_at_agents_and_dist() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.build.corpus_dir, PathBuf::from("agents"));
        assert_eq!(cfg.build.output_dir, PathBuf::from("dist"));
        assert!(cfg.build.provenance);
        assert_eq!(cfg.build.min_body_chars, 50);
    }

    #[test]
    fn default_no_color_is_false() {
        assert!(!AppConfig::default().output.no_color);
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "[build]\ncorpus_dir = \"templates\"\nstrict = true\n").unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.build.corpus_dir, PathBuf::from("templates"));
        assert!(cfg.build.strict);
        // Untouched keys keep their defaults.
        assert_eq!(cfg.build.output_dir, PathBuf::from("dist"));
        assert_eq!(cfg.source, Some(path));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = PathBuf::from("/absolutely/does/not/exist.toml");
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.toml");
        std::fs::write(&path, "[build\n").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn get_walks_dotted_keys() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get("build.jobs"), Some(serde_json::json!(0)));
        assert_eq!(cfg.get("output.format"), Some(serde_json::json!("human")));
        assert_eq!(cfg.get("build.nope"), None);
        assert!(cfg.get("build").is_some_and(|v| v.is_object()));
    }

    #[test]
    fn config_path_is_not_empty() {
        let p = AppConfig::config_path();
        assert!(!p.as_os_str().is_empty());
    }
}
