use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use rgit_ref::RefStore;

use crate::Cli;
use super::open_repo;

/// List all refs in the repository.
#[derive(Args)]
pub struct ShowRefArgs {}

pub fn run(_args: &ShowRefArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let refs = repo.refs();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut found_any = false;
    for ref_result in refs.iter(Some("refs/"))? {
        let reference = ref_result?;
        let Some(oid) = reference.peel_to_oid(refs)? else {
            continue;
        };
        writeln!(out, "{} {}", oid.to_hex(), reference.name().as_str())?;
        found_any = true;
    }

    Ok(if found_any { 0 } else { 1 })
}
