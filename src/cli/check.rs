//! # Check Command
//!
//! This module implements the check/modify command for license headers.
//! This is the default command when no subcommand is specified.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use crate::config::{DEFAULT_BACKUP_DIRNAME, load_config};
use crate::diff::DiffPrinter;
use crate::header::LicenseHeader;
use crate::info_log;
use crate::logging::{ColorMode, init_tracing, set_quiet, set_verbose};
use crate::processor::Processor;
use crate::report::FileOutcome;
use crate::rule::LicenseRule;
use crate::year::YearSelectionMode;

/// Arguments for the check command
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
  /// File or directory patterns to process. Directories are processed
  /// recursively.
  #[arg(required = false)]
  pub patterns: Vec<String>,

  /// Rule template file (repeatable; rules are tried in order and the first
  /// match wins)
  #[arg(long, short = 'r', value_name = "FILE")]
  pub rule: Vec<PathBuf>,

  /// Path to config file (default: .edheader.toml in the root path)
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Ignore config file even if present
  #[arg(long)]
  pub no_config: bool,

  /// Root of the overall project; year queries run against the git
  /// repository found here (default: current directory)
  #[arg(long, value_name = "DIR")]
  pub root: Option<PathBuf>,

  /// The project the processed files belong to, for subproject year
  /// selection and backup layout (default: the root path)
  #[arg(long, value_name = "DIR")]
  pub project: Option<PathBuf>,

  /// Dry run mode: only check for license headers without modifying files
  /// (default)
  #[arg(long, group = "mode", hide = true)]
  pub dry_run: bool,

  /// Modify mode: add or update license headers in files
  #[arg(
    long,
    group = "mode",
    help = "Modify mode: add or update license headers in files

[default: --dry-run]"
  )]
  pub modify: bool,

  /// Show diff of changes in dry run mode
  #[arg(long)]
  pub show_diff: bool,

  /// Save diff of changes to a file in dry run mode
  #[arg(long, short = 'o', value_name = "FILE")]
  pub save_diff: Option<PathBuf>,

  /// Where to write pre-formatting backups (default: .edheader-backup under
  /// the root path)
  #[arg(long, value_name = "DIR")]
  pub backup_dir: Option<PathBuf>,

  /// Default year selection mode for rules without a year_mode directive
  #[arg(long, value_name = "MODE", value_enum)]
  pub year_mode: Option<YearSelectionMode>,

  /// File patterns to ignore (supports glob patterns)
  #[arg(long, short = 'i')]
  pub ignore: Vec<String>,

  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except errors
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Control when to use colored output (auto, never, always)
  #[arg(
    long,
    value_name = "WHEN",
    num_args = 0..=1,
    default_value_t = ColorMode::Auto,
    default_missing_value = "always",
    value_enum
  )]
  pub colors: ColorMode,

  /// Generate a JSON report of the run and save to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_json: Option<PathBuf>,
}

impl CheckArgs {
  /// Validate the arguments and return an error if invalid
  fn validate(&self) -> Result<(), String> {
    if self.patterns.is_empty() {
      return Err("Missing required argument: <PATTERNS>...".to_string());
    }
    Ok(())
  }
}

/// Run the check command with the given arguments
pub fn run_check(args: CheckArgs) -> Result<()> {
  // Validate arguments
  if let Err(e) = args.validate() {
    eprintln!("ERROR: {e}");
    process::exit(1);
  }

  // Initialize tracing subscriber for structured logging
  init_tracing(args.quiet, args.verbose);

  // Set verbose mode for output formatting and info_log! macro
  if args.verbose > 0 {
    set_verbose();
  } else if args.quiet {
    set_quiet();
  }
  args.colors.apply();

  let root_path = match args.root {
    Some(root) => root,
    None => std::env::current_dir().with_context(|| "Failed to determine current directory")?,
  };
  let project_path = args.project.unwrap_or_else(|| root_path.clone());

  // Load configuration file if present
  let config = load_config(&root_path, args.config.as_deref(), args.no_config)?;

  if config.is_some() {
    debug!("Using configuration file");
  }

  // CLI flags override the config file
  let year_mode = args
    .year_mode
    .or_else(|| config.as_ref().map(|(c, _)| c.year_mode))
    .unwrap_or_default();

  let backup_folder = args
    .backup_dir
    .or_else(|| config.as_ref().and_then(|(c, base)| c.backup_dir.as_ref().map(|d| base.join(d))))
    .unwrap_or_else(|| root_path.join(DEFAULT_BACKUP_DIRNAME));

  let mut ignore_patterns = config.as_ref().map(|(c, _)| c.ignore.clone()).unwrap_or_default();
  ignore_patterns.extend(args.ignore);

  // Rules given on the command line replace the config's rule list entirely.
  let header = if args.rule.is_empty() {
    match config {
      Some((mut cfg, base)) => {
        cfg.year_mode = year_mode;
        cfg.build_header(&base)?
      }
      None => LicenseHeader::default(),
    }
  } else {
    let mut cli_header = LicenseHeader::default();
    for template_path in &args.rule {
      cli_header.add_rule(LicenseRule::from_file(template_path, year_mode)?);
    }
    cli_header
  };

  if !header.is_valid() {
    eprintln!("ERROR: No license rules configured");
    eprintln!("Pass --rule <FILE> or list rules in a config file");
    process::exit(1);
  }

  // Determine mode (dry run is default if neither is specified or if dry_run
  // is explicitly set)
  let check_only = args.dry_run || !args.modify;

  let diff = DiffPrinter::new(args.show_diff, args.save_diff);
  diff.init()?;

  let processor = Processor::new(
    header,
    root_path,
    project_path,
    backup_folder,
    ignore_patterns,
    diff,
  )?;

  let files = processor.collect_files(&args.patterns)?;

  if files.is_empty() {
    info_log!("No files matched the given patterns.");
    return Ok(());
  }

  let (summary, outcome) = if check_only {
    (processor.check(&files)?, FileOutcome::Invalid)
  } else {
    (processor.apply(&files)?, FileOutcome::Updated)
  };

  if check_only {
    for file in &summary.flagged {
      info_log!(" - Invalid header in file {}", file.display());
    }
    info_log!("{} out of {} files have invalid headers.", summary.flagged.len(), summary.total);
  } else {
    for file in &summary.flagged {
      info_log!(" - Updated file {}", file.display());
    }
    info_log!("Updated {} out of {} files.", summary.flagged.len(), summary.total);
  }

  // Generate JSON report if requested
  if let Some(ref output_path) = args.report_json {
    let report = summary.to_report(outcome);
    if let Err(e) = report.write_json(output_path) {
      eprintln!("Error generating JSON report: {e:#}");
    } else {
      info_log!("Generated JSON report at {}", output_path.display());
    }
  }

  if !summary.failures.is_empty() {
    process::exit(1);
  }

  // Exit with non-zero code if in check mode and there are issues
  if check_only && !summary.flagged.is_empty() {
    process::exit(1);
  }

  Ok(())
}
