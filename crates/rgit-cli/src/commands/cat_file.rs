use std::io::{self, Write};

use anyhow::{bail, Result};
use clap::Args;
use rgit_object::ObjectType;

use super::open_repo;
use crate::Cli;

/// Provide content or type information for a repository object.
#[derive(Args)]
pub struct CatFileArgs {
    /// Object type to expect (blob, tree, commit, or tag)
    #[arg(value_name = "type")]
    obj_type: String,

    /// Object to display, by full or abbreviated OID or ref name
    object: String,
}

pub fn run(args: &CatFileArgs, cli: &Cli) -> Result<i32> {
    let expected_type: ObjectType = args
        .obj_type
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid object type: {}", args.obj_type))?;

    let repo = open_repo(cli)?;
    let oid = rgit_repository::resolve_name(&repo, &args.object)?;

    let obj = repo.odb().read(&oid)?;
    if obj.object_type() != expected_type {
        bail!(
            "expected {} but {} is a {}",
            expected_type,
            args.object,
            obj.object_type()
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    out.write_all(&obj.serialize_content())?;
    Ok(0)
}
