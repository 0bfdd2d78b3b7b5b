//! # Git Module
//!
//! This module contains the year resolver: it maps a repository root and a
//! target path (a file or a directory subtree) to the calendar year of the
//! most recent commit that modified that path.
//!
//! Repository handles are cached per repository root inside a [`GitContext`]
//! that the orchestration layer owns and passes by reference into the engine.
//! The context opens one handle per distinct root and only the owner closes
//! entries, after all per-file operations for a run have completed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use chrono::Datelike;
use git2::{Commit, Oid, Repository, Tree};
use tracing::trace;

/// Errors from year resolution.
///
/// The resolver has no fallback policy of its own: callers decide whether a
/// [`YearError::NoHistory`] fails the file operation or falls back to a
/// default year.
#[derive(Debug, thiserror::Error)]
pub enum YearError {
  /// The given root path is not a git repository root.
  #[error("not a git repository root: {path}")]
  NotARepository {
    path: PathBuf,
    #[source]
    source: git2::Error,
  },

  /// The target path is not located under the repository root.
  #[error("path {path} is outside repository {root}")]
  OutsideRepository { root: PathBuf, path: PathBuf },

  /// No commit in the repository history touches the target path.
  #[error("no commit history touches {path}")]
  NoHistory { path: PathBuf },

  /// A commit carries a timestamp outside the representable range.
  #[error("commit timestamp out of range: {seconds}")]
  BadTimestamp { seconds: i64 },

  /// Any other git operation failure.
  #[error(transparent)]
  Git(#[from] git2::Error),
}

/// Process-wide cache of open repository handles, keyed by repository root.
///
/// One entry is created per distinct root encountered in a run. The engine
/// never evicts entries; the orchestration layer calls [`GitContext::close`]
/// or [`GitContext::close_all`] once all file operations have completed.
///
/// `git2::Repository` is not `Sync`, so each handle sits behind its own
/// mutex: concurrent file operations against the same root are safe but
/// serialize their history queries on that handle.
#[derive(Default)]
pub struct GitContext {
  repos: RwLock<HashMap<PathBuf, Arc<Mutex<Repository>>>>,
}

impl GitContext {
  /// Creates an empty context with no open handles.
  pub fn new() -> Self {
    Self::default()
  }

  /// Opens the repository rooted at `root` and caches the handle.
  ///
  /// Idempotent: reuses an existing entry for the same root. Fails when
  /// `root` is not a repository root.
  pub fn open(&self, root: &Path) -> Result<(), YearError> {
    let _ = self.handle(root)?;
    Ok(())
  }

  /// Returns whether a handle is currently cached for `root`.
  pub fn is_open(&self, root: &Path) -> bool {
    let repos = self.repos.read().unwrap_or_else(|e| e.into_inner());
    repos.contains_key(&cache_key(root))
  }

  /// Closes and removes the handle for `root`, if one is cached.
  ///
  /// Must not race with in-flight queries; the orchestration layer calls this
  /// only after all per-file operations for the run have completed.
  pub fn close(&self, root: &Path) -> bool {
    let mut repos = self.repos.write().unwrap_or_else(|e| e.into_inner());
    repos.remove(&cache_key(root)).is_some()
  }

  /// Closes every cached handle.
  pub fn close_all(&self) {
    let mut repos = self.repos.write().unwrap_or_else(|e| e.into_inner());
    repos.clear();
  }

  /// Returns the calendar year of the most recent commit that modified
  /// `target`, querying history rooted at `root`.
  ///
  /// `target` may be a file or a directory subtree, absolute or relative to
  /// `root`. The repository root itself resolves to the year of the `HEAD`
  /// commit. Deterministic for a fixed repository state.
  ///
  /// # Errors
  ///
  /// - [`YearError::NotARepository`] when `root` is not a repository root
  /// - [`YearError::NoHistory`] when no commit touches `target`
  pub fn modification_year(&self, root: &Path, target: &Path) -> Result<i32, YearError> {
    let handle = self.handle(root)?;
    let repo = handle.lock().unwrap_or_else(|e| e.into_inner());

    let rel = relative_target(&repo, root, target)?;
    trace!("Resolving modification year for {} in {}", rel.display(), root.display());

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(git2::Sort::TIME)?;
    revwalk.push_head()?;

    for oid in revwalk {
      let commit = repo.find_commit(oid?)?;

      // An empty relative path means the repository root itself; every commit
      // modifies the root tree, so the newest commit wins immediately.
      if rel.as_os_str().is_empty() || commit_touches(&commit, &rel)? {
        return commit_year(&commit);
      }
    }

    Err(YearError::NoHistory {
      path: target.to_path_buf(),
    })
  }

  /// Fetches the cached handle for `root`, opening the repository on first
  /// use.
  fn handle(&self, root: &Path) -> Result<Arc<Mutex<Repository>>, YearError> {
    let key = cache_key(root);

    {
      let repos = self.repos.read().unwrap_or_else(|e| e.into_inner());
      if let Some(handle) = repos.get(&key) {
        return Ok(Arc::clone(handle));
      }
    }

    let repo = Repository::open(root).map_err(|source| YearError::NotARepository {
      path: root.to_path_buf(),
      source,
    })?;

    let mut repos = self.repos.write().unwrap_or_else(|e| e.into_inner());
    // Another worker may have opened the same root between the locks.
    let handle = repos.entry(key).or_insert_with(|| Arc::new(Mutex::new(repo)));
    Ok(Arc::clone(handle))
  }
}

/// Normalizes a root path for use as a cache key.
fn cache_key(root: &Path) -> PathBuf {
  root.canonicalize().unwrap_or_else(|_| root.to_path_buf())
}

/// Computes `target` relative to the repository working directory.
fn relative_target(repo: &Repository, root: &Path, target: &Path) -> Result<PathBuf, YearError> {
  if target.is_relative() {
    return Ok(target.to_path_buf());
  }

  let workdir = repo.workdir().map(cache_key).unwrap_or_else(|| cache_key(root));
  let canonical = target.canonicalize().unwrap_or_else(|_| target.to_path_buf());

  canonical
    .strip_prefix(&workdir)
    .map(Path::to_path_buf)
    .map_err(|_| YearError::OutsideRepository {
      root: root.to_path_buf(),
      path: target.to_path_buf(),
    })
}

/// Looks up the object id of `rel` within a tree, `None` when absent.
fn tree_entry_id(tree: &Tree<'_>, rel: &Path) -> Option<Oid> {
  tree.get_path(rel).ok().map(|entry| entry.id())
}

/// Reports whether a commit modified `rel` with respect to its parents.
///
/// A commit touches a path when the path's tree entry differs from every
/// parent, matching git log's default history simplification: merge commits
/// that merely carry a change through one parent do not count.
fn commit_touches(commit: &Commit<'_>, rel: &Path) -> Result<bool, YearError> {
  let current = tree_entry_id(&commit.tree()?, rel);

  if commit.parent_count() == 0 {
    return Ok(current.is_some());
  }

  for parent in commit.parents() {
    if tree_entry_id(&parent.tree()?, rel) == current {
      return Ok(false);
    }
  }

  Ok(true)
}

/// Converts a commit's timestamp into a calendar year in the committer's
/// local time.
fn commit_year(commit: &Commit<'_>) -> Result<i32, YearError> {
  let time = commit.time();
  let seconds = time.seconds() + i64::from(time.offset_minutes()) * 60;

  chrono::DateTime::from_timestamp(seconds, 0)
    .map(|dt| dt.year())
    .ok_or(YearError::BadTimestamp { seconds })
}
