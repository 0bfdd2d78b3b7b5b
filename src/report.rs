//! # Report Module
//!
//! Machine-readable run reports. The engine's summaries (changed, invalid
//! and failed files) can be serialized to JSON for consumption by build
//! pipelines.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

/// Outcome of processing one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOutcome {
  /// The file was rewritten with a corrected header.
  Updated,
  /// The file already carried a valid header; nothing was written.
  Unchanged,
  /// The file's header is missing or drifted (check mode).
  Invalid,
  /// Processing the file failed; it is excluded from the updated count.
  Failed,
}

/// One file's entry in the run report.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
  /// Path to the file.
  pub path: PathBuf,
  /// What happened to it.
  pub outcome: FileOutcome,
  /// Failure detail, present only for [`FileOutcome::Failed`].
  #[serde(skip_serializing_if = "Option::is_none")]
  pub detail: Option<String>,
}

impl FileEntry {
  pub fn new(path: impl Into<PathBuf>, outcome: FileOutcome) -> Self {
    Self {
      path: path.into(),
      outcome,
      detail: None,
    }
  }

  pub fn failed(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      outcome: FileOutcome::Failed,
      detail: Some(detail.into()),
    }
  }
}

/// The serialized run report.
#[derive(Debug, Serialize)]
pub struct RunReport {
  /// When the report was generated.
  pub generated_at: String,
  /// Total number of candidate files.
  pub total: usize,
  /// Number of files rewritten (or found invalid, in check mode).
  pub flagged: usize,
  /// Per-file entries, excluding unchanged files kept out for brevity.
  pub files: Vec<FileEntry>,
}

impl RunReport {
  /// Builds a report from per-file entries; unchanged files are counted but
  /// not itemized.
  pub fn new(total: usize, entries: Vec<FileEntry>) -> Self {
    let files: Vec<FileEntry> = entries
      .into_iter()
      .filter(|entry| entry.outcome != FileOutcome::Unchanged)
      .collect();

    Self {
      generated_at: Local::now().to_rfc3339(),
      total,
      flagged: files
        .iter()
        .filter(|entry| entry.outcome != FileOutcome::Failed)
        .count(),
      files,
    }
  }

  /// Writes the report as JSON to `output_path`.
  pub fn write_json(&self, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(self).with_context(|| "Failed to serialize run report")?;

    fs::write(output_path, json).with_context(|| format!("Failed to write report: {}", output_path.display()))?;

    Ok(())
  }
}
