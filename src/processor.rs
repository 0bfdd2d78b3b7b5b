//! # Processor Module
//!
//! This module drives the engine across a set of source files: it collects
//! candidate files from patterns, opens the repository handle once, runs the
//! per-file apply (or check) operation on a worker pool, and produces an
//! aggregate summary.
//!
//! Per-file operations are independent; the only shared state is the
//! read-only rule set and the repository handle cache. Files are processed
//! with no ordering guarantee, and one file's failure never aborts the run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use glob::Pattern;
use rayon::prelude::*;
use tracing::debug;
use walkdir::WalkDir;

use crate::diff::DiffPrinter;
use crate::git::GitContext;
use crate::header::{FormatRequest, LicenseHeader};
use crate::report::{FileEntry, FileOutcome, RunReport};
use crate::verbose_log;

/// Aggregate result of a check or apply run.
#[derive(Debug, Default)]
pub struct RunSummary {
  /// Number of candidate files visited.
  pub total: usize,
  /// Files that were rewritten (apply) or found invalid (check).
  pub flagged: Vec<PathBuf>,
  /// Files whose processing failed, with the failure rendered for reporting.
  pub failures: Vec<(PathBuf, String)>,
}

impl RunSummary {
  /// Builds the serializable run report, labelling flagged files with
  /// `outcome`.
  pub fn to_report(&self, outcome: FileOutcome) -> RunReport {
    let mut entries: Vec<FileEntry> = self.flagged.iter().map(|path| FileEntry::new(path, outcome)).collect();
    entries.extend(
      self
        .failures
        .iter()
        .map(|(path, detail)| FileEntry::failed(path, detail.clone())),
    );

    RunReport::new(self.total, entries)
  }
}

/// Processor for running license header operations over many files.
///
/// Owns the rule set, the repository handle cache and the per-run paths. The
/// orchestration contract: [`Processor::apply`] and [`Processor::check`]
/// open the repository handle before the bulk of the file work and close it
/// after all per-file operations complete.
pub struct Processor {
  /// The ordered rule set; read-only at apply time.
  header: LicenseHeader,

  /// Repository handle cache shared by all file operations.
  git: GitContext,

  /// The repository root (history queries are rooted here).
  root_path: PathBuf,

  /// The project directly containing the files being processed.
  project_path: PathBuf,

  /// Where pre-formatting backups are written.
  backup_folder: PathBuf,

  /// Compiled ignore patterns.
  ignore_patterns: Vec<Pattern>,

  /// Diff preview output for check mode.
  diff: DiffPrinter,
}

impl Processor {
  /// Creates a processor.
  ///
  /// # Errors
  ///
  /// Returns an error when the rule set is empty (the licensing feature must
  /// be disabled in that case) or when an ignore pattern is not a valid
  /// glob.
  pub fn new(
    header: LicenseHeader,
    root_path: PathBuf,
    project_path: PathBuf,
    backup_folder: PathBuf,
    ignore_patterns: Vec<String>,
    diff: DiffPrinter,
  ) -> Result<Self> {
    if !header.is_valid() {
      anyhow::bail!("License header configuration is empty; no rules to validate or format with");
    }

    let ignore_patterns = ignore_patterns
      .iter()
      .map(|p| Pattern::new(p))
      .collect::<Result<Vec<_>, _>>()
      .with_context(|| "Invalid ignore glob pattern")?;

    Ok(Self {
      header,
      git: GitContext::new(),
      root_path,
      project_path,
      backup_folder,
      ignore_patterns,
      diff,
    })
  }

  /// Collects candidate files from file, directory and glob patterns.
  ///
  /// Directories are walked recursively; symlinks are skipped. The result is
  /// deduplicated and sorted so runs are deterministic.
  pub fn collect_files(&self, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut collected = HashSet::new();

    for pattern in patterns {
      let path = PathBuf::from(pattern);
      if path.is_file() {
        collected.insert(path);
      } else if path.is_dir() {
        self.walk_directory(&path, &mut collected)?;
      } else {
        let entries = glob::glob(pattern).with_context(|| format!("Invalid glob pattern: {pattern}"))?;

        for entry in entries {
          match entry {
            Ok(path) if path.is_file() => {
              collected.insert(path);
            }
            Ok(path) if path.is_dir() => self.walk_directory(&path, &mut collected)?,
            Ok(_) => {}
            Err(e) => eprintln!("Error with glob pattern: {e}"),
          }
        }
      }
    }

    // Relative pattern paths are resolved to one canonical absolute form, so
    // backup mirroring and history queries see paths under the project and
    // root prefixes. Re-deduplicate: a relative and an absolute spelling of
    // the same file collapse only after canonicalization.
    let mut files: Vec<PathBuf> = collected
      .into_iter()
      .map(|path| path.canonicalize().unwrap_or(path))
      .filter(|p| !self.is_ignored(p))
      .collect::<HashSet<_>>()
      .into_iter()
      .collect();
    files.sort();

    debug!("Collected {} candidate files", files.len());
    Ok(files)
  }

  /// Formats every file, rewriting those whose header is missing or drifted.
  ///
  /// Opens the repository handle once up front (a failure there is fatal to
  /// the run) and closes it after all per-file work has completed. Per-file
  /// failures are reported and counted without aborting the run.
  pub fn apply(&self, files: &[PathBuf]) -> Result<RunSummary> {
    self
      .git
      .open(&self.root_path)
      .with_context(|| format!("Failed to open git repository at {}", self.root_path.display()))?;

    let updated = Mutex::new(Vec::new());
    let failures = Mutex::new(Vec::new());

    files.par_iter().for_each(|file| {
      verbose_log!("=> Visiting {}...", file.display());

      let request = FormatRequest {
        root_path: self.root_path.clone(),
        project_path: self.project_path.clone(),
        source_file: file.clone(),
        backup_folder: self.backup_folder.clone(),
      };

      match self.header.format(&self.git, &request) {
        Ok(true) => updated.lock().unwrap_or_else(|e| e.into_inner()).push(file.clone()),
        Ok(false) => {}
        Err(e) => {
          eprintln!("Error processing {}: {:#}", file.display(), e);
          failures.lock().unwrap_or_else(|e| e.into_inner()).push((file.clone(), format!("{e:#}")));
        }
      }
    });

    self.git.close(&self.root_path);

    let mut flagged = updated.into_inner().unwrap_or_else(|e| e.into_inner());
    flagged.sort();

    Ok(RunSummary {
      total: files.len(),
      flagged,
      failures: failures.into_inner().unwrap_or_else(|e| e.into_inner()),
    })
  }

  /// Validates every file without writing, collecting those whose header is
  /// missing or drifted.
  ///
  /// When a diff preview was requested, the would-be rewrite is rendered for
  /// each invalid file (this resolves years, so it opens the repository on
  /// demand; preview failures degrade to a warning).
  pub fn check(&self, files: &[PathBuf]) -> Result<RunSummary> {
    let invalid = Mutex::new(Vec::new());
    let failures = Mutex::new(Vec::new());

    files.par_iter().for_each(|file| {
      match self.check_file(file) {
        Ok(true) => {}
        Ok(false) => invalid.lock().unwrap_or_else(|e| e.into_inner()).push(file.clone()),
        Err(e) => {
          eprintln!("Error processing {}: {:#}", file.display(), e);
          failures.lock().unwrap_or_else(|e| e.into_inner()).push((file.clone(), format!("{e:#}")));
        }
      }
    });

    self.git.close_all();

    let mut flagged = invalid.into_inner().unwrap_or_else(|e| e.into_inner());
    flagged.sort();

    Ok(RunSummary {
      total: files.len(),
      flagged,
      failures: failures.into_inner().unwrap_or_else(|e| e.into_inner()),
    })
  }

  /// Validates one file, emitting a diff preview for invalid files when
  /// requested.
  fn check_file(&self, file: &Path) -> Result<bool> {
    let source =
      std::fs::read_to_string(file).with_context(|| format!("Failed to read file: {}", file.display()))?;

    if self.header.validate_source(&source) {
      return Ok(true);
    }

    if self.diff.enabled()
      && let Some(rule) = self.header.matching_rule(&source)
    {
      match rule.resolve_year(&self.git, &self.root_path, &self.project_path, file) {
        Ok(year) => {
          let corrected = rule.rewrite(&source, year);
          if let Err(e) = self.diff.emit(file, &source, &corrected) {
            eprintln!("Warning: Failed to render diff for {}: {:#}", file.display(), e);
          }
        }
        Err(e) => {
          eprintln!("Warning: Failed to preview rewrite for {}: {:#}", file.display(), e);
        }
      }
    }

    Ok(false)
  }

  fn walk_directory(&self, dir: &Path, collected: &mut HashSet<PathBuf>) -> Result<()> {
    for entry in WalkDir::new(dir) {
      let entry = entry.with_context(|| format!("Failed to walk directory: {}", dir.display()))?;
      if entry.file_type().is_file() {
        collected.insert(entry.path().to_path_buf());
      }
    }
    Ok(())
  }

  /// Checks a path against the configured ignore globs.
  fn is_ignored(&self, path: &Path) -> bool {
    let Some(path_str) = path.to_str() else {
      return false;
    };
    let normalized = path_str.replace('\\', "/");
    let stripped = normalized.strip_prefix("./").unwrap_or(&normalized);

    self.ignore_patterns.iter().any(|pattern| {
      pattern.matches(&normalized) || pattern.matches(stripped)
    })
  }
}
