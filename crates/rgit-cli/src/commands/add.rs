use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::Cli;
use super::open_repo;

/// Stage file contents into the index.
#[derive(Args)]
pub struct AddArgs {
    /// Files or directories to stage
    #[arg(required = true, value_name = "path")]
    paths: Vec<PathBuf>,
}

pub fn run(args: &AddArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;
    rgit_repository::add(&mut repo, &args.paths)?;
    repo.write_index()?;
    Ok(0)
}
