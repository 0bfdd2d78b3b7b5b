//! # Configuration Module
//!
//! This module provides configuration support for edheader: the ordered rule
//! template list, the default year selection mode, the backup folder and
//! ignore patterns.
//!
//! Configuration is read from an `.edheader.toml` file or from the path in
//! the `EDHEADER_CONFIG` environment variable; CLI flags override it.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::header::LicenseHeader;
use crate::rule::LicenseRule;
use crate::verbose_log;
use crate::year::YearSelectionMode;

/// The default config file name.
pub const DEFAULT_CONFIG_FILENAME: &str = ".edheader.toml";

/// Environment variable for specifying config file path.
pub const CONFIG_ENV_VAR: &str = "EDHEADER_CONFIG";

/// The default backup folder name, relative to the root path.
pub const DEFAULT_BACKUP_DIRNAME: &str = ".edheader-backup";

/// One entry in the ordered rule list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RuleConfig {
  /// Path to the rule's template definition, relative to the config file.
  pub template: PathBuf,
}

/// Main configuration struct for edheader.
///
/// Loaded from an `.edheader.toml` file. The rule list is ordered; rules are
/// tried in sequence and the first match wins, so the file's order is
/// meaningful.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
  /// Default year selection mode for all rules (each rule may override it
  /// with a `year_mode` directive).
  #[serde(default, rename = "year-mode")]
  pub year_mode: YearSelectionMode,

  /// Backup folder for pre-formatting file copies.
  /// Defaults to `.edheader-backup` under the root path.
  #[serde(default, rename = "backup-dir")]
  pub backup_dir: Option<PathBuf>,

  /// Glob patterns for files to skip.
  #[serde(default)]
  pub ignore: Vec<String>,

  /// Ordered rule template list.
  #[serde(default)]
  pub rules: Vec<RuleConfig>,
}

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("Failed to read config file '{path}': {source}")]
  ReadError { path: PathBuf, source: std::io::Error },

  /// The config file contains invalid TOML.
  #[error("Failed to parse config file '{path}': {source}")]
  ParseError { path: PathBuf, source: toml::de::Error },
}

impl Config {
  /// Load configuration from a file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    verbose_log!("Loading config from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
      path: path.to_path_buf(),
      source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
      path: path.to_path_buf(),
      source: e,
    })?;

    Ok(config)
  }

  /// Builds the ordered rule set from this configuration.
  ///
  /// Template paths are resolved relative to `base_dir` (the directory the
  /// config file lives in). The returned header may be empty; callers check
  /// [`LicenseHeader::is_valid`] and disable the feature when it is not.
  pub fn build_header(&self, base_dir: &Path) -> anyhow::Result<LicenseHeader> {
    let mut header = LicenseHeader::default();

    for rule_config in &self.rules {
      let template_path = if rule_config.template.is_absolute() {
        rule_config.template.clone()
      } else {
        base_dir.join(&rule_config.template)
      };

      header.add_rule(LicenseRule::from_file(&template_path, self.year_mode)?);
    }

    Ok(header)
  }
}

/// Locates and loads the configuration, if any.
///
/// Resolution order: the explicit `--config` path, then `EDHEADER_CONFIG`,
/// then `.edheader.toml` in `root`. Returns the config together with the
/// directory template paths resolve against. `no_config` suppresses implicit
/// lookup but not an explicit path.
pub fn load_config(
  root: &Path,
  explicit: Option<&Path>,
  no_config: bool,
) -> Result<Option<(Config, PathBuf)>, ConfigError> {
  if let Some(path) = explicit {
    let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
    return Ok(Some((Config::load(path)?, base)));
  }

  if no_config {
    return Ok(None);
  }

  if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
    let path = PathBuf::from(env_path);
    let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
    return Ok(Some((Config::load(&path)?, base)));
  }

  let default_path = root.join(DEFAULT_CONFIG_FILENAME);
  if default_path.is_file() {
    return Ok(Some((Config::load(&default_path)?, root.to_path_buf())));
  }

  Ok(None)
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  #[test]
  fn test_parse_full_config() {
    let config: Config = toml::from_str(
      r#"
        year-mode = "file"
        backup-dir = "build/backup"
        ignore = ["**/generated/**"]

        [[rules]]
        template = "codeformat/JAVA_HEADER"

        [[rules]]
        template = "codeformat/DEFAULT_HEADER"
      "#,
    )
    .expect("config parses");

    assert_eq!(config.year_mode, YearSelectionMode::File);
    assert_eq!(config.backup_dir.as_deref(), Some(Path::new("build/backup")));
    assert_eq!(config.rules.len(), 2);
    // Order of the rule list is preserved.
    assert_eq!(config.rules[0].template, Path::new("codeformat/JAVA_HEADER"));
  }

  #[test]
  fn test_empty_config_defaults() {
    let config: Config = toml::from_str("").expect("empty config parses");
    assert_eq!(config.year_mode, YearSelectionMode::Subproject);
    assert!(config.backup_dir.is_none());
    assert!(config.rules.is_empty());
  }

  #[test]
  fn test_build_header_resolves_relative_templates() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("HEADER"), "# Copyright YEAR Org\n")?;

    let config: Config = toml::from_str("[[rules]]\ntemplate = \"HEADER\"\n")?;
    let header = config.build_header(dir.path())?;

    assert!(header.is_valid());
    assert_eq!(header.len(), 1);
    Ok(())
  }

  #[test]
  fn test_build_header_empty_rules_is_not_valid() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let header = Config::default().build_header(dir.path())?;
    assert!(!header.is_valid());
    Ok(())
  }

  #[test]
  fn test_load_reports_parse_errors() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(DEFAULT_CONFIG_FILENAME);
    fs::write(&path, "year-mode = [not toml")?;

    let err = Config::load(&path).expect_err("invalid toml must fail");
    assert!(matches!(err, ConfigError::ParseError { .. }));
    Ok(())
  }
}
