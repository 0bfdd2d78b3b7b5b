//! # Header Module
//!
//! This module defines [`LicenseHeader`]: an ordered list of
//! [`LicenseRule`]s with first-match-wins dispatch. Validation and
//! formatting are delegated to the first rule whose match predicate accepts
//! the file's current text; a file no rule matches is treated as not having
//! a valid header, never as "not applicable".

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::trace;

use crate::git::GitContext;
use crate::rule::LicenseRule;

/// The per-file paths a format operation needs.
///
/// Mirrors what the orchestration layer resolves once per run (root, project,
/// backup folder) plus the file currently being visited.
#[derive(Debug, Clone)]
pub struct FormatRequest {
  /// The root of the overall root project (the repository root).
  pub root_path: PathBuf,
  /// The root of the project directly containing the file.
  pub project_path: PathBuf,
  /// The file to be licensed.
  pub source_file: PathBuf,
  /// The folder receiving pre-formatting backups.
  pub backup_folder: PathBuf,
}

/// An ordered license rule set.
///
/// Order is significant: rules are tried in sequence and the first match
/// wins. The set is immutable once configured and safe to share across
/// concurrent per-file operations.
#[derive(Debug, Default)]
pub struct LicenseHeader {
  rules: Vec<LicenseRule>,
}

impl LicenseHeader {
  /// Creates a header from an ordered list of rules.
  pub const fn new(rules: Vec<LicenseRule>) -> Self {
    Self { rules }
  }

  /// Appends a rule at the end of the sequence (configuration time only).
  pub fn add_rule(&mut self, rule: LicenseRule) {
    self.rules.push(rule);
  }

  /// Returns whether this header can be used for validation and formatting.
  ///
  /// An empty rule sequence gives no deterministic way to validate or format;
  /// callers must disable the entire licensing feature when this is `false`.
  pub fn is_valid(&self) -> bool {
    !self.rules.is_empty()
  }

  /// Number of configured rules.
  pub fn len(&self) -> usize {
    self.rules.len()
  }

  /// Whether the rule sequence is empty.
  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  /// Finds the first rule whose match predicate accepts `source`.
  pub fn matching_rule(&self, source: &str) -> Option<&LicenseRule> {
    self.rules.iter().find(|rule| rule.matches(source))
  }

  /// Validates the file at `path` against the rule set.
  ///
  /// Returns `true` when the first matching rule judges the existing header
  /// conformant, `false` when it does not or when no rule matches. Never
  /// writes.
  pub fn validate(&self, path: &Path) -> Result<bool> {
    let source = fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

    Ok(self.validate_source(&source))
  }

  /// Validates already-read file content against the rule set.
  pub fn validate_source(&self, source: &str) -> bool {
    match self.matching_rule(source) {
      Some(rule) => rule.validate(source),
      None => false,
    }
  }

  /// Formats the file named by `request` to carry the correct header.
  ///
  /// Delegates to the first matching rule; the rule writes a backup and the
  /// corrected content only when the result differs from the original.
  ///
  /// # Returns
  ///
  /// `true` when the file changed; `false` when it was already correct or no
  /// rule matched (in which case no file-system change is made).
  pub fn format(&self, ctx: &GitContext, request: &FormatRequest) -> Result<bool> {
    let source = fs::read_to_string(&request.source_file)
      .with_context(|| format!("Failed to read file: {}", request.source_file.display()))?;

    let Some(rule) = self.matching_rule(&source) else {
      trace!("No rule matches {}", request.source_file.display());
      return Ok(false);
    };

    rule.format_file(
      ctx,
      &request.root_path,
      &request.project_path,
      &request.source_file,
      &request.backup_folder,
      &source,
    )
  }
}
