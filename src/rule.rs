//! # Rule Module
//!
//! This module defines [`LicenseRule`]: a header template plus a matching
//! predicate, parsed from a small directive syntax.
//!
//! A rule definition is plain text. Lines starting with the metadata marker
//! `;;` carry `key: value` directives (`match_from`, `year_mode`); lines
//! starting with the comment marker `;;#` are authoring comments and are
//! stripped from the emitted header. Every other line is header text, in
//! which the `YEAR` token is substituted with the resolved year at format
//! time.
//!
//! ## Example
//!
//! ```rust
//! use edheader::rule::LicenseRule;
//! use edheader::year::YearSelectionMode;
//!
//! # fn main() -> anyhow::Result<()> {
//! let rule = LicenseRule::parse(
//!   ";;match_from: ^package\n\
//!    ;;#Applies to Java sources.\n\
//!    /*\n * Copyright YEAR ExampleCorp\n */",
//!   YearSelectionMode::Subproject,
//! )?;
//!
//! assert!(rule.matches("package com.example;\n"));
//! assert!(rule.validate("/*\n * Copyright 2021 ExampleCorp\n */\n\npackage com.example;\n"));
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Datelike;
use regex::Regex;
use tracing::debug;

use crate::backup;
use crate::git::{GitContext, YearError};
use crate::year::YearSelectionMode;

/// Marker introducing a `key: value` directive line in a rule definition.
pub const METADATA_MARKER: &str = ";;";

/// Marker introducing an authoring comment line, stripped from the header.
pub const COMMENT_MARKER: &str = ";;#";

/// Directive key supplying the pattern that recognizes applicability and
/// locates where the existing header region ends.
pub const MATCH_FROM_KEY: &str = "match_from";

/// Directive key overriding the year selection mode for a single rule.
pub const YEAR_MODE_KEY: &str = "year_mode";

/// Placeholder token substituted with the resolved year at format time.
pub const YEAR_KEY: &str = "YEAR";

/// Year token accepted when validating an existing header: a four-digit year
/// or a year range.
const YEAR_TOKEN_PATTERN: &str = r"\d{4}(?:-\d{4})?";

/// Errors from parsing a rule definition.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
  /// A directive line is not of the `;;key: value` form.
  #[error("malformed directive line: `{line}`")]
  MalformedDirective { line: String },

  /// A directive uses a key this implementation does not recognize.
  ///
  /// Unknown keys are rejected rather than ignored so a typo in a directive
  /// cannot silently become header text.
  #[error("unknown directive key `{key}`")]
  UnknownDirective { key: String },

  /// The `match_from` directive holds an invalid regular expression.
  #[error("invalid `match_from` pattern `{pattern}`")]
  BadMatchFrom {
    pattern: String,
    #[source]
    source: regex::Error,
  },

  /// The `year_mode` directive holds an unrecognized mode name.
  #[error("unknown year mode `{value}` (expected `subproject`, `project` or `file`)")]
  BadYearMode { value: String },

  /// The definition contains no header text after stripping directives.
  #[error("rule definition contains no header text")]
  EmptyTemplate,
}

/// A single matcher/template unit: decides whether it applies to a file's
/// current text, whether the existing header conforms to its template, and
/// what the corrected file body is.
///
/// Rules are immutable once parsed and safe to share across concurrent
/// per-file operations.
#[derive(Debug)]
pub struct LicenseRule {
  /// Header text with directives and authoring comments stripped, no
  /// trailing newline.
  template: String,

  /// Pattern recognizing which files this rule governs and where the
  /// existing header region ends. `None` makes the rule a catch-all.
  match_from: Option<Regex>,

  /// Anchored pattern matching the rendered header with any well-formed year
  /// token, plus trailing blank lines.
  header_pattern: Regex,

  /// Year selection mode used when formatting files under this rule.
  year_mode: YearSelectionMode,
}

impl LicenseRule {
  /// Parses a rule definition.
  ///
  /// `default_mode` is used unless the definition carries a `year_mode`
  /// directive.
  ///
  /// # Errors
  ///
  /// Returns a [`RuleError`] when a directive is malformed or unknown, the
  /// `match_from` pattern does not compile, or no header text remains after
  /// stripping directive lines.
  pub fn parse(definition: &str, default_mode: YearSelectionMode) -> Result<Self, RuleError> {
    let mut match_from = None;
    let mut year_mode = default_mode;
    let mut template_lines = Vec::new();

    for line in definition.lines() {
      if line.starts_with(COMMENT_MARKER) {
        continue;
      }

      if let Some(directive) = line.strip_prefix(METADATA_MARKER) {
        let (key, value) = directive.split_once(':').ok_or_else(|| RuleError::MalformedDirective {
          line: line.to_string(),
        })?;

        match key.trim() {
          MATCH_FROM_KEY => {
            let pattern = value.trim();
            // Multi-line so `^` anchors match at line starts: the boundary
            // line usually sits below the header being replaced.
            let regex = regex::RegexBuilder::new(pattern)
              .multi_line(true)
              .build()
              .map_err(|source| RuleError::BadMatchFrom {
                pattern: pattern.to_string(),
                source,
              })?;
            match_from = Some(regex);
          }
          YEAR_MODE_KEY => {
            year_mode = parse_year_mode(value.trim())?;
          }
          key => {
            return Err(RuleError::UnknownDirective { key: key.to_string() });
          }
        }

        continue;
      }

      template_lines.push(line);
    }

    // Trailing blank lines in the definition are authoring noise, not header
    // text.
    while template_lines.last().is_some_and(|line| line.trim().is_empty()) {
      template_lines.pop();
    }

    if template_lines.is_empty() {
      return Err(RuleError::EmptyTemplate);
    }

    let template = template_lines.join("\n");
    let header_pattern = build_header_pattern(&template)?;

    Ok(Self {
      template,
      match_from,
      header_pattern,
      year_mode,
    })
  }

  /// Parses a rule definition from a file.
  pub fn from_file(path: &Path, default_mode: YearSelectionMode) -> Result<Self> {
    let definition =
      fs::read_to_string(path).with_context(|| format!("Failed to read rule template: {}", path.display()))?;

    Self::parse(&definition, default_mode).with_context(|| format!("Invalid rule template: {}", path.display()))
  }

  /// Reports whether this rule governs a file with the given content.
  ///
  /// Pure predicate over the full current text; never consults the file path
  /// or the year. A rule without a `match_from` directive matches everything.
  pub fn matches(&self, source: &str) -> bool {
    match &self.match_from {
      Some(regex) => regex.is_match(source),
      None => true,
    }
  }

  /// Reports whether the existing header region already conforms to this
  /// rule's template.
  ///
  /// The year placeholder is accepted as any well-formed year token; an
  /// existing header with a plausible year stays valid even when the commit
  /// year has since advanced.
  pub fn validate(&self, source: &str) -> bool {
    match &self.match_from {
      Some(regex) => {
        let Some(boundary) = regex.find(source) else {
          return false;
        };
        let region = &source[..boundary.start()];
        // The region must consist of exactly the header plus blank lines.
        self
          .header_pattern
          .find(region)
          .is_some_and(|m| m.end() == region.len())
      }
      None => self.header_pattern.is_match(source),
    }
  }

  /// Renders the header text with the given year substituted.
  pub fn render(&self, year: i32) -> String {
    self.template.replace(YEAR_KEY, &year.to_string())
  }

  /// Computes the corrected file body: the rendered header followed by a
  /// blank line and the rest of the file, replacing the existing header
  /// region when present and prepending otherwise.
  pub fn rewrite(&self, source: &str, year: i32) -> String {
    let header = self.render(year);

    let rest = match &self.match_from {
      // Everything before the match boundary is the header region, drifted
      // or not; it is replaced wholesale.
      Some(regex) => regex.find(source).map_or(source, |m| &source[m.start()..]),
      None => self.header_pattern.find(source).map_or(source, |m| &source[m.end()..]),
    };

    if rest.is_empty() {
      format!("{header}\n")
    } else {
      format!("{header}\n\n{rest}")
    }
  }

  /// The year selection mode in effect for this rule.
  pub const fn year_mode(&self) -> YearSelectionMode {
    self.year_mode
  }

  /// Resolves the year this rule would stamp into `source_file`.
  ///
  /// Falls back to the current calendar year when no commit history touches
  /// the selected path (a file not yet committed, for example). Repository
  /// and other git failures propagate.
  pub fn resolve_year(
    &self,
    ctx: &GitContext,
    root_path: &Path,
    project_path: &Path,
    source_file: &Path,
  ) -> Result<i32> {
    match self.year_mode.get_year(ctx, root_path, project_path, source_file) {
      Ok(year) => Ok(year),
      Err(YearError::NoHistory { path }) => {
        let fallback = chrono::Local::now().year();
        debug!(
          "No commit history touches {}; falling back to year {}",
          path.display(),
          fallback
        );
        Ok(fallback)
      }
      Err(e) => Err(e).with_context(|| format!("Failed to resolve year for {}", source_file.display())),
    }
  }

  /// Formats a file with the corrected header.
  ///
  /// Resolves the year for this rule's mode, computes the corrected body and,
  /// only when it differs byte-for-byte from `source`, writes a backup of the
  /// original under `backup_folder` (mirroring the file's path relative to
  /// `project_path`) and overwrites the file.
  ///
  /// # Returns
  ///
  /// `true` when the file changed, `false` when it was already correct.
  pub fn format_file(
    &self,
    ctx: &GitContext,
    root_path: &Path,
    project_path: &Path,
    source_file: &Path,
    backup_folder: &Path,
    source: &str,
  ) -> Result<bool> {
    let year = self.resolve_year(ctx, root_path, project_path, source_file)?;
    let formatted = self.rewrite(source, year);

    if formatted == source {
      return Ok(false);
    }

    backup::write_backup(backup_folder, project_path, source_file, source)?;

    fs::write(source_file, formatted).with_context(|| format!("Failed to write file: {}", source_file.display()))?;

    Ok(true)
  }
}

fn parse_year_mode(value: &str) -> Result<YearSelectionMode, RuleError> {
  match value {
    "subproject" => Ok(YearSelectionMode::Subproject),
    "project" => Ok(YearSelectionMode::Project),
    "file" => Ok(YearSelectionMode::File),
    other => Err(RuleError::BadYearMode {
      value: other.to_string(),
    }),
  }
}

/// Builds the anchored pattern matching the rendered header with any
/// well-formed year token, plus trailing blank lines.
fn build_header_pattern(template: &str) -> Result<Regex, RuleError> {
  let mut pattern = String::from(r"\A");

  for (i, part) in template.split(YEAR_KEY).enumerate() {
    if i > 0 {
      pattern.push_str(YEAR_TOKEN_PATTERN);
    }
    pattern.push_str(&regex::escape(part));
  }

  pattern.push_str(r"\n*");

  Regex::new(&pattern).map_err(|source| RuleError::BadMatchFrom {
    pattern,
    source,
  })
}
