use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::Cli;
use super::open_repo;

/// Materialize a commit's tree into a new directory.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Commit to check out
    commit: String,

    /// Destination directory (must be empty or absent)
    path: PathBuf,
}

pub fn run(args: &CheckoutArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let oid = rgit_repository::resolve_name(&repo, &args.commit)?;
    repo.checkout(oid, &args.path)?;
    Ok(0)
}
