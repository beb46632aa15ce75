use std::io::{self, Write};

use anyhow::Result;
use bstr::BStr;
use clap::Args;

use crate::Cli;
use super::open_repo;

/// Check whether paths are excluded by gitignore rules.
#[derive(Args)]
pub struct CheckIgnoreArgs {
    /// Paths to check
    #[arg(required = true, value_name = "path")]
    paths: Vec<String>,
}

pub fn run(args: &CheckIgnoreArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let ignore = rgit_repository::build_ignore_engine(&repo)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut found_ignored = false;
    for path in &args.paths {
        let is_dir = repo.work_tree().join(path).is_dir();
        if ignore.is_ignored(BStr::new(path.as_bytes()), is_dir) {
            found_ignored = true;
            writeln!(out, "{path}")?;
        }
    }

    Ok(if found_ignored { 0 } else { 1 })
}
