//! # edheader
//!
//! A tool that keeps license headers in source files correct, with copyright
//! years derived from git commit history.

use anyhow::Result;
use edheader::cli::{Cli, run_check};

fn main() -> Result<()> {
  let cli = Cli::parse_args();

  run_check(cli.get_check_args())
}
