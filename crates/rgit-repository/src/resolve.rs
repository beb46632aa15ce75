//! Name resolution (spec §4.5): turn a user-supplied name into an OID.

use rgit_hash::ObjectId;
use rgit_object::{Object, ObjectType};
use rgit_odb::PrefixResolution;
use rgit_ref::{RefName, RefStore};

use crate::{Repository, RepoError};

/// What kind of object a resolved name named, before any type coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl From<ObjectType> for ResolvedKind {
    fn from(t: ObjectType) -> Self {
        match t {
            ObjectType::Blob => ResolvedKind::Blob,
            ObjectType::Tree => ResolvedKind::Tree,
            ObjectType::Commit => ResolvedKind::Commit,
            ObjectType::Tag => ResolvedKind::Tag,
        }
    }
}

/// Resolve `name` to an OID, trying in order: the literal `HEAD`, a hex OID
/// (full or 4-40 char abbreviation), `refs/tags/<name>`, `refs/heads/<name>`.
///
/// An empty name has no candidates and always fails with `UnknownName`.
pub fn resolve_name(repo: &Repository, name: &str) -> Result<ObjectId, RepoError> {
    if name.is_empty() {
        return Err(RepoError::UnknownName(name.to_string()));
    }

    if name == "HEAD" {
        let head = RefName::new_unchecked("HEAD");
        return repo
            .refs()
            .resolve_to_oid(&head)?
            .ok_or_else(|| RepoError::UnknownName(name.to_string()));
    }

    if is_hex_abbrev(name) {
        match repo.odb().resolve_prefix(name)? {
            PrefixResolution::Found(oid) => return Ok(oid),
            PrefixResolution::Ambiguous(candidates) => {
                return Err(RepoError::AmbiguousName {
                    name: name.to_string(),
                    candidates,
                })
            }
            PrefixResolution::NotFound => {}
        }
    }

    if let Some(tag_name) = RefName::new(format!("refs/tags/{name}")).ok() {
        if let Some(oid) = repo.refs().resolve_to_oid(&tag_name)? {
            return Ok(oid);
        }
    }

    if let Some(branch_name) = RefName::new(format!("refs/heads/{name}")).ok() {
        if let Some(oid) = repo.refs().resolve_to_oid(&branch_name)? {
            return Ok(oid);
        }
    }

    Err(RepoError::UnknownName(name.to_string()))
}

/// A full 40-char hex OID, or a 4-40 char hex abbreviation (spec §4.5 rule 3).
fn is_hex_abbrev(name: &str) -> bool {
    (4..=40).contains(&name.len()) && name.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Resolve `name`, then coerce the result to `wanted` by peeling tags to
/// their target and commits to their tree, per spec §4.5's optional "follow"
/// phase. Any other combination is a hard `CannotCoerce` error.
pub fn resolve_to_type(
    repo: &Repository,
    name: &str,
    wanted: ResolvedKind,
) -> Result<ObjectId, RepoError> {
    let oid = resolve_name(repo, name)?;
    coerce(repo, oid, wanted)
}

fn coerce(repo: &Repository, oid: ObjectId, wanted: ResolvedKind) -> Result<ObjectId, RepoError> {
    let object = repo.odb().read(&oid)?;
    let kind = ResolvedKind::from(object.object_type());

    if kind == wanted {
        return Ok(oid);
    }

    match (&object, wanted) {
        (Object::Tag(tag), _) => {
            let target = tag.target()?;
            coerce(repo, target, wanted)
        }
        (Object::Commit(commit), ResolvedKind::Tree) => Ok(commit.tree()?),
        _ => Err(RepoError::CannotCoerce {
            oid,
            from: object.object_type(),
            to: match wanted {
                ResolvedKind::Blob => "blob",
                ResolvedKind::Tree => "tree",
                ResolvedKind::Commit => "commit",
                ResolvedKind::Tag => "tag",
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgit_object::Tree;

    fn init_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn empty_name_fails() {
        let (_dir, repo) = init_repo();
        assert!(matches!(
            resolve_name(&repo, ""),
            Err(RepoError::UnknownName(_))
        ));
    }

    #[test]
    fn unknown_branch_fails() {
        let (_dir, repo) = init_repo();
        assert!(matches!(
            resolve_name(&repo, "nope"),
            Err(RepoError::UnknownName(_))
        ));
    }

    #[test]
    fn resolves_full_hex_oid() {
        let (_dir, repo) = init_repo();
        let oid = repo
            .odb()
            .write_raw(ObjectType::Blob, b"hello")
            .unwrap();
        let resolved = resolve_name(&repo, &oid.to_hex()).unwrap();
        assert_eq!(resolved, oid);
    }

    #[test]
    fn resolves_unambiguous_abbreviation() {
        let (_dir, repo) = init_repo();
        let oid = repo
            .odb()
            .write_raw(ObjectType::Blob, b"hello")
            .unwrap();
        let abbrev = &oid.to_hex()[..8];
        let resolved = resolve_name(&repo, abbrev).unwrap();
        assert_eq!(resolved, oid);
    }

    #[test]
    fn resolves_branch_name() {
        let (_dir, repo) = init_repo();
        let oid = repo
            .odb()
            .write_raw(ObjectType::Blob, b"hello")
            .unwrap();
        let name = RefName::new("refs/heads/feature").unwrap();
        repo.refs().create(&name, &oid).unwrap();
        assert_eq!(resolve_name(&repo, "feature").unwrap(), oid);
    }

    #[test]
    fn coerces_commit_to_tree() {
        let (_dir, repo) = init_repo();
        let blob_oid = repo.odb().write_raw(ObjectType::Blob, b"x").unwrap();
        let mut tree = Tree::new();
        tree.entries.push(rgit_object::TreeEntry {
            mode: rgit_object::FileMode::Regular,
            name: bstr::BString::from("a.txt"),
            oid: blob_oid,
        });
        let tree_oid = repo
            .odb()
            .write_raw(ObjectType::Tree, &tree.serialize_content())
            .unwrap();

        let sig = rgit_utils::date::Signature {
            name: bstr::BString::from("Test"),
            email: bstr::BString::from("test@example.com"),
            date: rgit_utils::date::GitDate::new(1_000_000_000, 0),
        };
        let commit = rgit_object::Commit::new(tree_oid, &[], &sig, &sig, "msg\n");
        let commit_oid = repo
            .odb()
            .write_raw(ObjectType::Commit, &commit.serialize_content())
            .unwrap();

        let resolved = resolve_to_type(&repo, &commit_oid.to_hex(), ResolvedKind::Tree).unwrap();
        assert_eq!(resolved, tree_oid);
    }

    #[test]
    fn tag_resolves_to_tags_ref() {
        let (_dir, repo) = init_repo();
        let blob_oid = repo.odb().write_raw(ObjectType::Blob, b"x").unwrap();
        let name = RefName::new("refs/tags/v1").unwrap();
        repo.refs().create(&name, &blob_oid).unwrap();
        assert_eq!(resolve_name(&repo, "v1").unwrap(), blob_oid);
    }
}
