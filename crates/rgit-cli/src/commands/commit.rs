use std::io::{self, Write};

use anyhow::{bail, Result};
use clap::Args;
use rgit_object::Object;

use crate::Cli;
use super::open_repo;

/// Record changes to the repository.
#[derive(Args)]
pub struct CommitArgs {
    /// Use the given message as the commit message
    #[arg(short = 'm', required = true, value_name = "message")]
    message: String,
}

pub fn run(args: &CommitArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;

    let tree = repo.index()?.write_tree(repo.odb())?;

    let is_unborn = repo.is_unborn()?;
    let parents: Vec<_> = repo.head_oid()?.into_iter().collect();

    if let Some(parent_oid) = parents.first() {
        if let Object::Commit(parent_commit) = repo.odb().read(parent_oid)? {
            if parent_commit.tree()? == tree {
                bail!("nothing to commit, working tree clean");
            }
        }
    }

    let mut message = args.message.clone();
    if !message.ends_with('\n') {
        message.push('\n');
    }

    let commit_oid = repo.commit_create(tree, &parents, message)?;
    repo.advance_head(commit_oid)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let hex = commit_oid.to_hex();
    let suffix = if is_unborn { " (root-commit)" } else { "" };
    writeln!(out, "[commit {}{}] {}", &hex[..7], suffix, args.message)?;

    Ok(0)
}
