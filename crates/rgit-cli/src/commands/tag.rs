use std::io::{self, Write};

use anyhow::{bail, Result};
use bstr::BString;
use clap::Args;
use rgit_object::Tag;
use rgit_ref::{RefName, RefStore};
use rgit_utils::date::{GitDate, Signature};

use crate::Cli;
use super::open_repo;

/// Create, list, or delete tags.
#[derive(Args)]
pub struct TagArgs {
    /// Create an annotated tag
    #[arg(short, long)]
    annotate: bool,

    /// Tag name
    name: Option<String>,

    /// Object to tag (defaults to HEAD)
    object: Option<String>,
}

pub fn run(args: &TagArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let Some(name) = &args.name else {
        return list_tags(&repo, &mut out);
    };

    let target_spec = args.object.as_deref().unwrap_or("HEAD");
    let target_oid = rgit_repository::resolve_name(&repo, target_spec)?;

    let refname = RefName::new(format!("refs/tags/{name}"))?;
    if repo.refs().resolve(&refname)?.is_some() {
        bail!("fatal: tag '{}' already exists", name);
    }

    if args.annotate {
        let (author_name, author_email) = repo.identity()?;
        let tagger = Signature {
            name: BString::from(author_name),
            email: BString::from(author_email),
            date: GitDate::now(),
        };

        let target_type = repo.odb().read(&target_oid)?.object_type();
        let tag = Tag::new(target_oid, target_type, name.as_str(), &tagger, "\n");
        let tag_oid = repo
            .odb()
            .write_raw(rgit_object::ObjectType::Tag, &tag.serialize_content())?;
        repo.refs().create(&refname, &tag_oid)?;
    } else {
        repo.refs().create(&refname, &target_oid)?;
    }

    Ok(0)
}

fn list_tags(repo: &rgit_repository::Repository, out: &mut impl Write) -> Result<i32> {
    for r in repo.refs().iter(Some("refs/tags/"))? {
        let r = r?;
        let short = r
            .name()
            .as_str()
            .strip_prefix("refs/tags/")
            .unwrap_or(r.name().as_str())
            .to_string();
        writeln!(out, "{short}")?;
    }
    Ok(0)
}
