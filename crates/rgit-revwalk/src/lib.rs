//! Ancestry graph description for `log` (spec §4.12).
//!
//! Walks a commit's parent edges depth-first and renders them as a
//! Graphviz `digraph`, matching the original implementation's `log`
//! output exactly rather than any pretty-printed commit log.

use std::collections::HashSet;
use std::fmt::Write as _;

use rgit_hash::ObjectId;
use rgit_object::Object;
use rgit_repository::Repository;

/// Errors produced by ancestry-graph rendering.
#[derive(Debug, thiserror::Error)]
pub enum RevWalkError {
    #[error("object is not a commit: {0}")]
    NotACommit(ObjectId),

    #[error(transparent)]
    Odb(#[from] rgit_odb::OdbError),

    #[error(transparent)]
    Object(#[from] rgit_object::ObjectError),

    #[error(transparent)]
    Repo(#[from] rgit_repository::RepoError),
}

/// Render the ancestry of `start` as a `digraph rgit-log{...}` description:
/// one node per reachable commit (`c_<oid> [label="<oid[:7]>: <summary>"]`)
/// and one edge per parent (`c_<oid> -> c_<parent>;`), depth-first,
/// visiting each commit at most once.
pub fn log_graph(repo: &Repository, start: ObjectId) -> Result<String, RevWalkError> {
    let mut out = String::new();
    out.push_str("digraph rgit-log{\n");
    out.push_str("  node[shape=rect]\n");

    let mut seen = HashSet::new();
    write_commit(repo, start, &mut seen, &mut out)?;

    out.push_str("}\n");
    Ok(out)
}

fn write_commit(
    repo: &Repository,
    oid: ObjectId,
    seen: &mut HashSet<ObjectId>,
    out: &mut String,
) -> Result<(), RevWalkError> {
    if !seen.insert(oid) {
        return Ok(());
    }

    let commit = match repo.odb().read(&oid)? {
        Object::Commit(c) => c,
        _ => return Err(RevWalkError::NotACommit(oid)),
    };

    let hex = oid.to_hex();
    let _ = writeln!(out, "  c_{0} [label=\"{1}: {2}\"]", hex, &hex[..7], commit.escaped_summary());

    for parent in commit.parents()? {
        let _ = writeln!(out, "  c_{0} -> c_{1};", hex, parent.to_hex());
        write_commit(repo, parent, seen, out)?;
    }

    Ok(())
}
