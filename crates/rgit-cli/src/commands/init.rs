use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::Cli;

/// Create an empty Git repository.
#[derive(Args)]
pub struct InitArgs {
    /// Directory to create the repository in (defaults to the current directory)
    path: Option<PathBuf>,
}

pub fn run(args: &InitArgs, _cli: &Cli) -> Result<i32> {
    let target = match &args.path {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    std::fs::create_dir_all(&target)?;
    let repo = rgit_repository::Repository::init(&target)?;

    let git_dir = std::fs::canonicalize(repo.git_dir()).unwrap_or_else(|_| repo.git_dir().to_path_buf());
    eprintln!("Initialized empty Git repository in {}/", git_dir.display());
    Ok(0)
}
