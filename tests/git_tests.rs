mod common;

use std::fs;

use anyhow::Result;
use common::{git_add_and_commit_dated, init_git_repo, is_git_available, run_git};
use edheader::git::{GitContext, YearError};
use edheader::year::YearSelectionMode;
use tempfile::tempdir;

#[test]
fn test_modification_year_uses_last_commit_touching_file() -> Result<()> {
  if !is_git_available() {
    println!("Skipping git test because git command is not available");
    return Ok(());
  }

  let temp_dir = tempdir()?;
  init_git_repo(temp_dir.path())?;

  fs::write(temp_dir.path().join("old.rs"), "fn old() {}\n")?;
  git_add_and_commit_dated(temp_dir.path(), "old.rs", "Add old", "2019-06-01T12:00:00 +0000")?;

  fs::write(temp_dir.path().join("new.rs"), "fn new() {}\n")?;
  git_add_and_commit_dated(temp_dir.path(), "new.rs", "Add new", "2021-03-15T12:00:00 +0000")?;

  let ctx = GitContext::new();

  // old.rs was last touched in 2019, even though newer commits exist.
  assert_eq!(ctx.modification_year(temp_dir.path(), &temp_dir.path().join("old.rs"))?, 2019);
  assert_eq!(ctx.modification_year(temp_dir.path(), &temp_dir.path().join("new.rs"))?, 2021);

  Ok(())
}

#[test]
fn test_modification_year_of_directory_tracks_subtree() -> Result<()> {
  if !is_git_available() {
    println!("Skipping git test because git command is not available");
    return Ok(());
  }

  let temp_dir = tempdir()?;
  init_git_repo(temp_dir.path())?;

  fs::create_dir_all(temp_dir.path().join("module/src"))?;
  fs::write(temp_dir.path().join("module/src/lib.rs"), "fn a() {}\n")?;
  git_add_and_commit_dated(temp_dir.path(), "module", "Add module", "2018-01-10T12:00:00 +0000")?;

  fs::write(temp_dir.path().join("other.rs"), "fn other() {}\n")?;
  git_add_and_commit_dated(temp_dir.path(), "other.rs", "Add other", "2023-07-01T12:00:00 +0000")?;

  fs::write(temp_dir.path().join("module/src/lib.rs"), "fn a() {}\nfn b() {}\n")?;
  git_add_and_commit_dated(temp_dir.path(), "module", "Extend module", "2020-05-20T12:00:00 +0000")?;

  let ctx = GitContext::new();

  // The directory's year is that of the last commit touching anything in it.
  assert_eq!(ctx.modification_year(temp_dir.path(), &temp_dir.path().join("module"))?, 2020);

  Ok(())
}

#[test]
fn test_repository_root_resolves_to_head_year() -> Result<()> {
  if !is_git_available() {
    println!("Skipping git test because git command is not available");
    return Ok(());
  }

  let temp_dir = tempdir()?;
  init_git_repo(temp_dir.path())?;

  fs::write(temp_dir.path().join("a.rs"), "fn a() {}\n")?;
  git_add_and_commit_dated(temp_dir.path(), "a.rs", "First", "2017-02-01T12:00:00 +0000")?;

  fs::write(temp_dir.path().join("b.rs"), "fn b() {}\n")?;
  git_add_and_commit_dated(temp_dir.path(), "b.rs", "Second", "2022-11-05T12:00:00 +0000")?;

  let ctx = GitContext::new();

  assert_eq!(ctx.modification_year(temp_dir.path(), temp_dir.path())?, 2022);

  Ok(())
}

#[test]
fn test_uncommitted_file_has_no_history() -> Result<()> {
  if !is_git_available() {
    println!("Skipping git test because git command is not available");
    return Ok(());
  }

  let temp_dir = tempdir()?;
  init_git_repo(temp_dir.path())?;

  fs::write(temp_dir.path().join("tracked.rs"), "fn tracked() {}\n")?;
  git_add_and_commit_dated(temp_dir.path(), "tracked.rs", "Initial", "2020-01-01T12:00:00 +0000")?;

  // Written but never committed.
  fs::write(temp_dir.path().join("fresh.rs"), "fn fresh() {}\n")?;

  let ctx = GitContext::new();
  let err = ctx
    .modification_year(temp_dir.path(), &temp_dir.path().join("fresh.rs"))
    .expect_err("uncommitted file has no history");

  assert!(matches!(err, YearError::NoHistory { .. }));

  Ok(())
}

#[test]
fn test_year_reflects_rename_commit() -> Result<()> {
  if !is_git_available() {
    println!("Skipping git test because git command is not available");
    return Ok(());
  }

  let temp_dir = tempdir()?;
  init_git_repo(temp_dir.path())?;

  fs::write(temp_dir.path().join("before.rs"), "fn f() {}\n")?;
  git_add_and_commit_dated(temp_dir.path(), "before.rs", "Add", "2016-04-01T12:00:00 +0000")?;

  run_git(temp_dir.path(), &["mv", "before.rs", "after.rs"])?;
  git_add_and_commit_dated(temp_dir.path(), "after.rs", "Rename", "2024-04-01T12:00:00 +0000")?;

  let ctx = GitContext::new();

  // The new path first appears in the rename commit.
  assert_eq!(ctx.modification_year(temp_dir.path(), &temp_dir.path().join("after.rs"))?, 2024);

  Ok(())
}

#[test]
fn test_handles_are_cached_per_root() -> Result<()> {
  if !is_git_available() {
    println!("Skipping git test because git command is not available");
    return Ok(());
  }

  let temp_dir = tempdir()?;
  init_git_repo(temp_dir.path())?;

  fs::write(temp_dir.path().join("a.rs"), "fn a() {}\n")?;
  git_add_and_commit_dated(temp_dir.path(), "a.rs", "Initial", "2020-01-01T12:00:00 +0000")?;

  let ctx = GitContext::new();
  assert!(!ctx.is_open(temp_dir.path()));

  ctx.open(temp_dir.path())?;
  assert!(ctx.is_open(temp_dir.path()));

  // Opening again reuses the entry.
  ctx.open(temp_dir.path())?;
  assert!(ctx.is_open(temp_dir.path()));

  assert!(ctx.close(temp_dir.path()));
  assert!(!ctx.is_open(temp_dir.path()));
  assert!(!ctx.close(temp_dir.path()));

  Ok(())
}

#[test]
fn test_year_selection_modes_pick_distinct_paths() -> Result<()> {
  if !is_git_available() {
    println!("Skipping git test because git command is not available");
    return Ok(());
  }

  let temp_dir = tempdir()?;
  init_git_repo(temp_dir.path())?;

  // Root-level file committed late; subproject files committed earlier.
  fs::create_dir_all(temp_dir.path().join("sub"))?;
  fs::write(temp_dir.path().join("sub/stale.rs"), "fn stale() {}\n")?;
  git_add_and_commit_dated(temp_dir.path(), "sub", "Add subproject", "2018-08-08T12:00:00 +0000")?;

  fs::write(temp_dir.path().join("sub/active.rs"), "fn active() {}\n")?;
  git_add_and_commit_dated(temp_dir.path(), "sub", "Update subproject", "2021-09-09T12:00:00 +0000")?;

  fs::write(temp_dir.path().join("root.rs"), "fn root() {}\n")?;
  git_add_and_commit_dated(temp_dir.path(), "root.rs", "Touch root", "2025-01-01T12:00:00 +0000")?;

  let ctx = GitContext::new();
  let root = temp_dir.path();
  let project = temp_dir.path().join("sub");
  let stale = project.join("stale.rs");

  // project mode follows the repository root, subproject mode the project
  // directory, file mode the individual file.
  let project_year = YearSelectionMode::Project.get_year(&ctx, root, &project, &stale)?;
  let subproject_year = YearSelectionMode::Subproject.get_year(&ctx, root, &project, &stale)?;
  let file_year = YearSelectionMode::File.get_year(&ctx, root, &project, &stale)?;

  assert_eq!(project_year, 2025);
  assert_eq!(subproject_year, 2021);
  assert_eq!(file_year, 2018);

  Ok(())
}
