use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use rgit_repository::StatusEntry;

use crate::Cli;
use super::open_repo;

/// Show the working tree status.
#[derive(Args)]
pub struct StatusArgs {}

pub fn run(_args: &StatusArgs, cli: &Cli) -> Result<i32> {
    let mut repo = open_repo(cli)?;
    let status = rgit_repository::status(&mut repo)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match (&status.branch, status.detached) {
        (Some(branch), _) => writeln!(out, "On branch {branch}.")?,
        (None, true) => writeln!(out, "HEAD detached.")?,
        (None, false) => writeln!(out, "On an unborn branch.")?,
    }

    if status.staged.is_empty() && status.unstaged.is_empty() {
        return Ok(0);
    }

    if !status.staged.is_empty() {
        writeln!(out, "Changes staged for commit:")?;
        for entry in &status.staged {
            writeln!(out, "\t{}", describe(entry))?;
        }
    }

    if !status.unstaged.is_empty() {
        writeln!(out, "Changes not staged for commit:")?;
        for entry in &status.unstaged {
            writeln!(out, "\t{}", describe(entry))?;
        }
    }

    Ok(0)
}

fn describe(entry: &StatusEntry) -> String {
    match entry {
        StatusEntry::AddedToIndex(p) => format!("new file:   {p}"),
        StatusEntry::ModifiedInIndex(p) => format!("modified:   {p}"),
        StatusEntry::DeletedFromIndex(p) => format!("deleted:    {p}"),
        StatusEntry::DeletedInWorktree(p) => format!("deleted:    {p}"),
        StatusEntry::ModifiedInWorktree(p) => format!("modified:   {p}"),
        StatusEntry::Untracked(p) => format!("untracked:  {p}"),
    }
}
