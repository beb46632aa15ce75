use std::io::{self, Write};

use anyhow::Result;
use bstr::ByteSlice;
use clap::Args;

use crate::Cli;
use super::open_repo;

/// Show information about files in the index.
#[derive(Args)]
pub struct LsFilesArgs {
    /// Show mode, object id, and stage alongside each path
    #[arg(short, long)]
    verbose: bool,
}

pub fn run(args: &LsFilesArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;
    let index = repo.index()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for entry in index.iter() {
        if args.verbose {
            writeln!(
                out,
                "{:06o} {} {}\t{}",
                entry.mode.raw(),
                entry.oid.to_hex(),
                entry.stage.as_u8(),
                entry.path.as_bstr(),
            )?;
        } else {
            writeln!(out, "{}", entry.path.as_bstr())?;
        }
    }

    Ok(0)
}
