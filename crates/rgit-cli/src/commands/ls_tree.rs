use std::io::{self, Write};

use anyhow::{bail, Result};
use bstr::ByteSlice;
use clap::Args;
use rgit_hash::ObjectId;
use rgit_object::Object;
use rgit_odb::ObjectDatabase;
use rgit_repository::ResolvedKind;

use crate::Cli;
use super::open_repo;

/// List the contents of a tree object.
#[derive(Args)]
pub struct LsTreeArgs {
    /// Recurse into sub-trees
    #[arg(short = 'r')]
    recurse: bool,

    /// Tree-ish to list
    #[arg(value_name = "tree")]
    tree_ish: String,
}

pub fn run(args: &LsTreeArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let odb = repo.odb();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let tree_oid = rgit_repository::resolve_to_type(&repo, &args.tree_ish, ResolvedKind::Tree)?;
    list_tree(odb, &tree_oid, "", args.recurse, &mut out)?;

    Ok(0)
}

fn list_tree(
    odb: &ObjectDatabase,
    tree_oid: &ObjectId,
    prefix: &str,
    recurse: bool,
    out: &mut impl Write,
) -> Result<()> {
    let tree = match odb.read(tree_oid)? {
        Object::Tree(t) => t,
        other => bail!("not a tree: {} is a {}", tree_oid.to_hex(), other.object_type()),
    };

    for entry in tree.iter() {
        let name = entry.name.to_str_lossy();
        let full_path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };

        let is_tree = entry.mode.is_tree();

        if is_tree && recurse {
            list_tree(odb, &entry.oid, &full_path, recurse, out)?;
        } else {
            let type_name = if is_tree {
                "tree"
            } else if entry.mode.is_gitlink() {
                "commit"
            } else {
                "blob"
            };
            writeln!(
                out,
                "{:06o} {} {}\t{}",
                entry.mode.raw(),
                type_name,
                entry.oid.to_hex(),
                full_path,
            )?;
        }
    }

    Ok(())
}
