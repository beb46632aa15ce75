use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use rgit_repository::ResolvedKind;

use crate::Cli;
use super::open_repo;

/// Show the commit ancestry graph reachable from a commit.
#[derive(Args)]
pub struct LogArgs {
    /// Commit to start from (default: HEAD)
    commit: Option<String>,
}

pub fn run(args: &LogArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let name = args.commit.as_deref().unwrap_or("HEAD");
    let oid = rgit_repository::resolve_to_type(&repo, name, ResolvedKind::Commit)?;

    let graph = rgit_revwalk::log_graph(&repo, oid)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    out.write_all(graph.as_bytes())?;
    Ok(0)
}
