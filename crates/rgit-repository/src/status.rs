//! Status engine (spec §4.10): branch line, HEAD↔index diff, index↔worktree diff.

use std::collections::BTreeMap;
use std::path::Path;

use bstr::{BStr, BString};
use rgit_hash::ObjectId;
use rgit_index::{IgnoreEngine, Stage};
use rgit_object::{Object, Tree};

use crate::{RepoError, Repository};

/// One changed or untracked path, labeled by which comparison produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEntry {
    /// Present in the index but not in the HEAD tree.
    AddedToIndex(BString),
    /// Present in both, but the blob differs.
    ModifiedInIndex(BString),
    /// Present in HEAD but no longer in the index.
    DeletedFromIndex(BString),
    /// Tracked in the index but missing from the worktree.
    DeletedInWorktree(BString),
    /// Tracked in the index but the worktree content differs.
    ModifiedInWorktree(BString),
    /// Present in the worktree but not tracked or ignored.
    Untracked(BString),
}

/// A full status snapshot.
#[derive(Debug, Clone)]
pub struct Status {
    /// Current branch, or `None` if HEAD is detached.
    pub branch: Option<String>,
    /// Whether HEAD is detached (points directly at a commit).
    pub detached: bool,
    /// Differences between HEAD's tree and the index.
    pub staged: Vec<StatusEntry>,
    /// Differences between the index and the worktree, plus untracked files.
    pub unstaged: Vec<StatusEntry>,
}

/// Compute the full repository status (spec §4.10): the branch line, then
/// the HEAD↔index diff, then the index↔worktree diff.
pub fn status(repo: &mut Repository) -> Result<Status, RepoError> {
    let branch = repo.current_branch()?;
    let detached = branch.is_none() && !repo.is_unborn()?;

    let head_tree = head_path_map(repo)?;

    let index_entries: Vec<IndexSnapshot> = repo
        .index()?
        .iter()
        .filter(|e| e.stage == Stage::Normal)
        .map(|e| IndexSnapshot {
            path: e.path.clone(),
            oid: e.oid,
            stat: e.stat,
        })
        .collect();
    let index_map: BTreeMap<BString, ObjectId> =
        index_entries.iter().map(|e| (e.path.clone(), e.oid)).collect();

    let staged = diff_head_index(&head_tree, &index_map);
    let unstaged = diff_index_worktree(repo, &index_entries)?;

    Ok(Status {
        branch,
        detached,
        staged,
        unstaged,
    })
}

/// A frozen copy of an index entry's path/oid/stat, taken before the
/// worktree diff so it can be compared without re-borrowing the index.
struct IndexSnapshot {
    path: BString,
    oid: ObjectId,
    stat: rgit_index::StatData,
}

/// Flatten HEAD's tree into a `path -> oid` map (empty if HEAD is unborn).
fn head_path_map(repo: &Repository) -> Result<BTreeMap<BString, ObjectId>, RepoError> {
    let mut map = BTreeMap::new();
    if let Some(head_oid) = repo.head_oid()? {
        let commit = match repo.odb().read(&head_oid)? {
            Object::Commit(c) => c,
            _ => return Ok(map),
        };
        let tree_oid = commit.tree()?;
        flatten_tree(repo, tree_oid, &BString::from(""), &mut map)?;
    }
    Ok(map)
}

fn flatten_tree(
    repo: &Repository,
    tree_oid: ObjectId,
    prefix: &BString,
    out: &mut BTreeMap<BString, ObjectId>,
) -> Result<(), RepoError> {
    let tree = match repo.odb().read(&tree_oid)? {
        Object::Tree(t) => t,
        _ => return Ok(()),
    };
    for entry in tree.iter() {
        let path = join_path(prefix, &entry.name);
        if entry.mode.is_tree() {
            flatten_tree(repo, entry.oid, &path, out)?;
        } else {
            out.insert(path, entry.oid);
        }
    }
    Ok(())
}

fn join_path(prefix: &BString, name: &BStr) -> BString {
    if prefix.is_empty() {
        BString::from(name.as_bytes())
    } else {
        let mut out = prefix.clone();
        out.extend_from_slice(b"/");
        out.extend_from_slice(name.as_bytes());
        out
    }
}

fn diff_head_index(
    head: &BTreeMap<BString, ObjectId>,
    index: &BTreeMap<BString, ObjectId>,
) -> Vec<StatusEntry> {
    let mut entries = Vec::new();

    for (path, oid) in index {
        match head.get(path) {
            None => entries.push(StatusEntry::AddedToIndex(path.clone())),
            Some(head_oid) if head_oid != oid => {
                entries.push(StatusEntry::ModifiedInIndex(path.clone()))
            }
            _ => {}
        }
    }
    for path in head.keys() {
        if !index.contains_key(path) {
            entries.push(StatusEntry::DeletedFromIndex(path.clone()));
        }
    }

    entries
}

/// Compare the index against the worktree: a stat-match short-circuits
/// re-hashing; any mismatch re-hashes the file's current content and
/// compares it against the staged blob (spec §4.10).
fn diff_index_worktree(
    repo: &Repository,
    index_entries: &[IndexSnapshot],
) -> Result<Vec<StatusEntry>, RepoError> {
    let work_tree = repo.work_tree().to_path_buf();
    let ignore = build_ignore_engine(repo)?;

    let mut entries = Vec::new();
    let mut tracked: std::collections::HashSet<BString> = std::collections::HashSet::new();

    for entry in index_entries {
        tracked.insert(entry.path.clone());
        let abs = work_tree.join(entry.path.to_string());

        match std::fs::symlink_metadata(&abs) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                entries.push(StatusEntry::DeletedInWorktree(entry.path.clone()));
            }
            Err(e) => return Err(e.into()),
            Ok(meta) => {
                if entry.stat.matches(&meta) {
                    continue;
                }

                let data = std::fs::read(&abs)?;
                let current_oid = rgit_hash::Hasher::hash_object("blob", &data)?;
                if current_oid != entry.oid {
                    entries.push(StatusEntry::ModifiedInWorktree(entry.path.clone()));
                }
            }
        }
    }

    let mut untracked = Vec::new();
    collect_untracked(&work_tree, &work_tree, &tracked, &ignore, &mut untracked)?;
    untracked.sort();
    entries.extend(untracked.into_iter().map(StatusEntry::Untracked));

    Ok(entries)
}

fn collect_untracked(
    work_tree: &Path,
    dir: &Path,
    tracked: &std::collections::HashSet<BString>,
    ignore: &IgnoreEngine,
    out: &mut Vec<BString>,
) -> Result<(), RepoError> {
    if dir.join(".git").exists() && dir != work_tree {
        return Ok(());
    }

    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.file_name().and_then(|n| n.to_str()) == Some(".git") {
            continue;
        }
        let meta = entry.metadata()?;
        let rel = to_repo_relative(work_tree, &path);

        if meta.is_dir() {
            if ignore.is_ignored(rel.as_ref(), true) && !is_tracked_under(tracked, &rel) {
                continue;
            }
            collect_untracked(work_tree, &path, tracked, ignore, out)?;
        } else {
            if tracked.contains(&rel) || ignore.is_ignored(rel.as_ref(), false) {
                continue;
            }
            out.push(rel);
        }
    }

    Ok(())
}

fn is_tracked_under(tracked: &std::collections::HashSet<BString>, dir: &BString) -> bool {
    let prefix = {
        let mut p = dir.clone();
        p.extend_from_slice(b"/");
        p
    };
    tracked.iter().any(|p| p.starts_with(prefix.as_slice()))
}

fn to_repo_relative(work_tree: &Path, path: &Path) -> BString {
    let rel = path.strip_prefix(work_tree).unwrap_or(path);
    let s = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    BString::from(s)
}

/// Build the ignore engine for a repository: the user global excludes file
/// first, then `info/exclude` (both absolute, spec §4.7), plus every
/// `.gitignore` found while walking the worktree, keyed by its containing
/// directory.
pub fn build_ignore_engine(repo: &Repository) -> Result<IgnoreEngine, RepoError> {
    let mut engine = IgnoreEngine::new();

    if let Some(global) = repo.config().global_ignore_path()? {
        engine.add_absolute_file(&global).map_err(RepoError::Index)?;
    }
    engine
        .add_absolute_file(&repo.git_dir().join("info/exclude"))
        .map_err(RepoError::Index)?;

    load_gitignores(repo.work_tree(), repo.work_tree(), &mut engine)?;
    Ok(engine)
}

fn load_gitignores(work_tree: &Path, dir: &Path, engine: &mut IgnoreEngine) -> Result<(), RepoError> {
    if dir.join(".git").exists() && dir != work_tree {
        return Ok(());
    }

    let gitignore = dir.join(".gitignore");
    if gitignore.is_file() {
        let content = std::fs::read(&gitignore)?;
        let rel_dir = to_repo_relative(work_tree, dir);
        engine.add_scoped_rules(rel_dir, rgit_index::ignore::parse_ignore_rules(&content));
    }

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.file_name().and_then(|n| n.to_str()) == Some(".git") {
            continue;
        }
        if entry.file_type()?.is_dir() {
            load_gitignores(work_tree, &path, engine)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn fresh_repo_has_no_branch_diffs() {
        let (_dir, mut repo) = init_repo();
        let s = status(&mut repo).unwrap();
        assert_eq!(s.branch, Some("master".to_string()));
        assert!(!s.detached);
        assert!(s.staged.is_empty());
        assert!(s.unstaged.is_empty());
    }

    #[test]
    fn untracked_file_is_reported() {
        let (dir, mut repo) = init_repo();
        std::fs::write(dir.path().join("a.txt"), b"hi").unwrap();
        let s = status(&mut repo).unwrap();
        assert_eq!(s.unstaged, vec![StatusEntry::Untracked(BString::from("a.txt"))]);
    }

    #[test]
    fn staged_new_file_shows_added() {
        let (dir, mut repo) = init_repo();
        std::fs::write(dir.path().join("a.txt"), b"hi").unwrap();
        crate::mutate::add(&mut repo, &[std::path::PathBuf::from("a.txt")]).unwrap();

        let s = status(&mut repo).unwrap();
        assert_eq!(s.staged, vec![StatusEntry::AddedToIndex(BString::from("a.txt"))]);
        assert!(s.unstaged.is_empty());
    }

    #[test]
    fn gitignored_file_is_not_untracked() {
        let (dir, mut repo) = init_repo();
        std::fs::write(dir.path().join(".gitignore"), b"*.log\n").unwrap();
        std::fs::write(dir.path().join("x.log"), b"noise").unwrap();

        let s = status(&mut repo).unwrap();
        assert!(s
            .unstaged
            .iter()
            .all(|e| !matches!(e, StatusEntry::Untracked(p) if p == "x.log")));
    }

    #[test]
    fn modified_worktree_file_detected() {
        let (dir, mut repo) = init_repo();
        std::fs::write(dir.path().join("a.txt"), b"hi").unwrap();
        crate::mutate::add(&mut repo, &[std::path::PathBuf::from("a.txt")]).unwrap();
        repo.write_index().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        std::fs::write(dir.path().join("a.txt"), b"changed").unwrap();
        repo.reload_index().unwrap();

        let s = status(&mut repo).unwrap();
        assert!(s
            .unstaged
            .iter()
            .any(|e| matches!(e, StatusEntry::ModifiedInWorktree(p) if p == "a.txt")));
    }
}
