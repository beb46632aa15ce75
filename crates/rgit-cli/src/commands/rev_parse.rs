use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use rgit_repository::{RepoError, ResolvedKind};

use crate::Cli;
use super::open_repo;

/// Resolve a name to an object ID.
#[derive(Args)]
pub struct RevParseArgs {
    /// Coerce the resolved name to the given object type
    #[arg(long = "type", value_name = "type")]
    object_type: Option<String>,

    /// Name to resolve
    name: String,
}

pub fn run(args: &RevParseArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let oid = match &args.object_type {
        Some(t) => {
            let wanted = parse_type(t)?;
            rgit_repository::resolve_to_type(&repo, &args.name, wanted)
        }
        None => rgit_repository::resolve_name(&repo, &args.name),
    };

    match oid {
        Ok(oid) => {
            writeln!(out, "{}", oid.to_hex())?;
            Ok(0)
        }
        Err(RepoError::AmbiguousName { name, candidates }) => {
            eprintln!("fatal: ambiguous argument '{name}': multiple candidates:");
            for candidate in candidates {
                eprintln!("  {}", candidate.to_hex());
            }
            Ok(128)
        }
        Err(e) => {
            eprintln!("fatal: {e}");
            Ok(128)
        }
    }
}

fn parse_type(s: &str) -> Result<ResolvedKind> {
    match s {
        "blob" => Ok(ResolvedKind::Blob),
        "tree" => Ok(ResolvedKind::Tree),
        "commit" => Ok(ResolvedKind::Commit),
        "tag" => Ok(ResolvedKind::Tag),
        other => anyhow::bail!("invalid object type: {other}"),
    }
}
