//! # Backup Module
//!
//! Before a file is overwritten with a corrected header, its original content
//! is preserved under a backup folder. The backup path mirrors the source
//! file's location relative to its owning project, so one backup folder can
//! hold an entire run's originals without collisions. Restoration, if any,
//! is an external concern.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Computes where the backup of `source_file` lives under `backup_folder`.
///
/// The source file's path relative to `project_path` is mirrored below the
/// backup folder. A file outside the project (or on another prefix entirely)
/// falls back to its file name alone.
pub fn backup_path(backup_folder: &Path, project_path: &Path, source_file: &Path) -> PathBuf {
  let relative = pathdiff::diff_paths(source_file, project_path)
    .filter(|rel| !rel.starts_with(".."))
    .or_else(|| source_file.file_name().map(PathBuf::from))
    .unwrap_or_else(|| source_file.to_path_buf());

  backup_folder.join(relative)
}

/// Writes `content` (a file's pre-formatting text) to the mirrored location
/// under `backup_folder`, creating parent directories as needed.
///
/// Called once per changed file per run, immediately before the original is
/// overwritten.
pub fn write_backup(backup_folder: &Path, project_path: &Path, source_file: &Path, content: &str) -> Result<()> {
  let target = backup_path(backup_folder, project_path, source_file);

  if let Some(parent) = target.parent() {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create backup folder: {}", parent.display()))?;
  }

  fs::write(&target, content).with_context(|| format!("Failed to write backup: {}", target.display()))?;

  Ok(())
}
