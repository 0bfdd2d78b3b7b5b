//! # edheader
//!
//! A tool that keeps license headers in source files correct, with copyright
//! years derived from git commit history.
//!
//! `edheader` carries an ordered list of header rules. For each file the first
//! matching rule is authoritative: it validates the text above the rule's
//! `match_from` boundary against the rendered header template, and in modify
//! mode rewrites drifted headers in place, backing up the original first. The
//! `YEAR` placeholder in a template is stamped with the year of the last
//! commit touching the file, its project or the whole repository, depending
//! on the rule's year selection mode.
//!
//! ## Features
//!
//! * Ordered rules with `match_from` dispatch; the first matching rule wins
//! * Copyright years resolved from git history, not the wall clock
//! * Per-rule year selection: subproject, project or per-file history
//! * Check-only mode to verify headers without modifying files
//! * Pre-formatting backups mirroring each file's project-relative path
//! * Ignore patterns to exclude specific files or directories
//!
//! ## Usage as a Library
//!
//! This crate can be used as a library in your Rust projects:
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! use edheader::diff::DiffPrinter;
//! use edheader::header::LicenseHeader;
//! use edheader::processor::Processor;
//! use edheader::rule::LicenseRule;
//! use edheader::year::YearSelectionMode;
//!
//! fn main() -> anyhow::Result<()> {
//!     // A rule's template holds the header text with a YEAR placeholder
//!     let rule = LicenseRule::parse(
//!         "// Copyright YEAR Example Org",
//!         YearSelectionMode::Subproject,
//!     )?;
//!
//!     let processor = Processor::new(
//!         LicenseHeader::new(vec![rule]),
//!         PathBuf::from("."),          // repository root
//!         PathBuf::from("."),          // project path
//!         PathBuf::from(".backup"),    // backup folder
//!         vec![],                      // no ignore patterns
//!         DiffPrinter::new(false, None),
//!     )?;
//!
//!     let files = processor.collect_files(&["src".to_string()])?;
//!     let summary = processor.apply(&files)?;
//!
//!     println!("Updated {} out of {} files.", summary.flagged.len(), summary.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! * [`header`] - The rule set and per-file dispatch
//! * [`rule`] - Rule templates, validation and rewriting
//! * [`git`] - Repository handles and modification-year queries
//! * [`processor`] - Batch check/apply over collected files
//!
//! [`header`]: crate::header
//! [`rule`]: crate::rule
//! [`git`]: crate::git
//! [`processor`]: crate::processor

// Re-export modules for public API
pub mod backup;
pub mod cli;
pub mod config;
pub mod diff;
pub mod git;
pub mod header;
pub mod logging;
pub mod processor;
pub mod report;
pub mod rule;
pub mod year;

// Re-export macros
// Note: We don't re-export the macros here since they're already defined in the logging module
// and would cause redefinition errors
