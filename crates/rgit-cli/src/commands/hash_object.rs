use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use rgit_hash::hasher::Hasher;
use rgit_object::ObjectType;

use super::open_repo;
use crate::Cli;

/// Compute the object ID for a file, optionally writing it to the object database.
#[derive(Args)]
pub struct HashObjectArgs {
    /// Object type (default: blob)
    #[arg(short = 't', default_value = "blob")]
    obj_type: ObjectType,

    /// Write the object into the repository's object database
    #[arg(short = 'w')]
    write: bool,

    /// File to hash
    path: String,
}

pub fn run(args: &HashObjectArgs, cli: &Cli) -> Result<i32> {
    let data = std::fs::read(&args.path)?;
    let type_str = std::str::from_utf8(args.obj_type.as_bytes())?;

    let oid = if args.write {
        let repo = open_repo(cli)?;
        repo.odb().write_raw(args.obj_type, &data)?
    } else {
        Hasher::hash_object(type_str, &data)?
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", oid.to_hex())?;
    Ok(0)
}
