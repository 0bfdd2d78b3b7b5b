//! # Year Selection Module
//!
//! This module defines the mode in which the copyright year is fetched for a
//! source file: shared across a subproject, shared across the whole root
//! project, or resolved per file.

use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;

use crate::git::{GitContext, YearError};

/// The mode in which the last-modification year is selected for a file.
///
/// The mode is a pure choice of which path is handed to the year resolver;
/// history is always queried against the repository root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum YearSelectionMode {
  /// The year is project-wide: every file in a subproject resolves to the
  /// year of the last commit touching the subproject directory.
  #[default]
  Subproject,
  /// The year is root-project-wide: every file resolves to the year of the
  /// last commit in the repository.
  Project,
  /// The year is file-specific: each file resolves to the year of the last
  /// commit touching that file.
  File,
}

impl YearSelectionMode {
  /// Picks the path whose history decides the year under this mode.
  pub fn commit_path<'a>(self, root_path: &'a Path, project_path: &'a Path, path: &'a Path) -> &'a Path {
    match self {
      YearSelectionMode::Subproject => project_path,
      YearSelectionMode::Project => root_path,
      YearSelectionMode::File => path,
    }
  }

  /// Gets the last modification year for `path` under this mode.
  ///
  /// History is queried against the repository rooted at `root_path`; the
  /// mode only scopes which path's last change is considered. In
  /// [`YearSelectionMode::Subproject`] mode the result is not file dependent.
  ///
  /// # Errors
  ///
  /// Propagates [`YearError`] from the resolver; this function applies no
  /// fallback of its own.
  pub fn get_year(
    self,
    ctx: &GitContext,
    root_path: &Path,
    project_path: &Path,
    path: &Path,
  ) -> Result<i32, YearError> {
    let commit_path = self.commit_path(root_path, project_path, path);
    ctx.modification_year(root_path, commit_path)
  }
}
