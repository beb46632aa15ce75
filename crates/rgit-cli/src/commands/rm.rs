use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::Cli;
use super::open_repo;

/// Remove files from the working tree and the index.
#[derive(Args)]
pub struct RmArgs {
    /// Files to remove
    #[arg(required = true, value_name = "path")]
    paths: Vec<PathBuf>,
}

pub fn run(args: &RmArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;
    rgit_repository::rm(&mut repo, &args.paths, true, false)?;
    repo.write_index()?;
    Ok(0)
}
