//! # Diff Module
//!
//! Renders the difference between a file's current content and the corrected
//! content a rule would write, for check mode previews.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use similar::{ChangeTag, TextDiff};

/// Emits unified-style diffs of would-be header rewrites.
pub struct DiffPrinter {
  /// Whether to print diffs to stderr.
  pub show: bool,

  /// Where to append diffs, if saving to a file was requested.
  pub save_path: Option<PathBuf>,
}

impl DiffPrinter {
  /// Creates a printer from the two check-mode flags.
  pub const fn new(show: bool, save_path: Option<PathBuf>) -> Self {
    Self { show, save_path }
  }

  /// Whether any diff output was requested at all.
  pub const fn enabled(&self) -> bool {
    self.show || self.save_path.is_some()
  }

  /// Prepares the save file for a new run, truncating leftovers from a
  /// previous one. Diffs from the run are then appended one by one.
  pub fn init(&self) -> Result<()> {
    if let Some(ref save_path) = self.save_path {
      std::fs::File::create(save_path)
        .with_context(|| format!("Failed to create diff file: {}", save_path.display()))?;
    }
    Ok(())
  }

  /// Renders the diff between `original` and `corrected` for one file.
  ///
  /// Printed to stderr when showing is enabled; appended to the save file
  /// when one was configured, so a run produces a single consolidated diff.
  pub fn emit(&self, path: &Path, original: &str, corrected: &str) -> Result<()> {
    if !self.enabled() {
      return Ok(());
    }

    let diff = TextDiff::from_lines(original, corrected);
    let mut rendered = format!("Diff for {}:\n", path.display());

    for change in diff.iter_all_changes() {
      let sign = match change.tag() {
        ChangeTag::Delete => "-",
        ChangeTag::Insert => "+",
        ChangeTag::Equal => " ",
      };
      rendered.push_str(sign);
      rendered.push_str(change.value());
    }
    rendered.push('\n');

    if self.show {
      eprint!("{rendered}");
    }

    if let Some(ref save_path) = self.save_path {
      let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(save_path)
        .with_context(|| format!("Failed to open diff file: {}", save_path.display()))?;

      file
        .write_all(rendered.as_bytes())
        .with_context(|| format!("Failed to write diff file: {}", save_path.display()))?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_disabled_printer_writes_nothing() -> Result<()> {
    let printer = DiffPrinter::new(false, None);
    assert!(!printer.enabled());
    printer.emit(Path::new("a.rs"), "old\n", "new\n")?;
    Ok(())
  }

  #[test]
  fn test_saved_diffs_are_appended() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let save_path = dir.path().join("changes.diff");
    let printer = DiffPrinter::new(false, Some(save_path.clone()));

    printer.emit(Path::new("a.rs"), "old line\n", "new line\n")?;
    printer.emit(Path::new("b.rs"), "x\n", "y\n")?;

    let saved = std::fs::read_to_string(&save_path)?;
    assert!(saved.contains("Diff for a.rs:"));
    assert!(saved.contains("-old line"));
    assert!(saved.contains("+new line"));
    assert!(saved.contains("Diff for b.rs:"));
    Ok(())
  }
}
