//! Index mutators (spec §4.11): `rm` and `add`.

use std::path::{Path, PathBuf};

use bstr::{BStr, BString};
use rgit_index::{EntryFlags, IndexEntry, Stage, StatData};
use rgit_object::{FileMode, ObjectType};

use crate::status::build_ignore_engine;
use crate::{RepoError, Repository};

/// Result of an `rm` operation: repo-relative paths that were removed from
/// the index, and (when `delete_files` was set) removed from disk.
#[derive(Debug, Default, Clone)]
pub struct RmOutcome {
    pub removed: Vec<BString>,
}

/// Result of an `add` operation: repo-relative paths staged.
#[derive(Debug, Default, Clone)]
pub struct AddOutcome {
    pub added: Vec<BString>,
}

/// Remove `paths` from the index (spec §4.11 `rm`).
///
/// Rejects any path outside the worktree. Unknown paths are a hard error
/// unless `skip_missing` is set. When `delete_files` is set, also unlinks
/// the worktree file for each removed entry.
pub fn rm(
    repo: &mut Repository,
    paths: &[PathBuf],
    delete_files: bool,
    skip_missing: bool,
) -> Result<RmOutcome, RepoError> {
    let work_tree = repo.work_tree().to_path_buf();
    let mut rel_paths = Vec::with_capacity(paths.len());
    for p in paths {
        rel_paths.push(repo_relative(&work_tree, p)?);
    }

    let index = repo.index_mut()?;
    let mut outcome = RmOutcome::default();

    for rel in &rel_paths {
        let bstr_path = BStr::new(rel.as_bytes());
        if index.get(bstr_path, Stage::Normal).is_none() {
            if skip_missing {
                continue;
            }
            return Err(RepoError::UnknownName(rel.to_string()));
        }
        index.remove(bstr_path, Stage::Normal);
        outcome.removed.push(rel.clone());
    }

    if delete_files {
        for rel in &outcome.removed {
            let abs = work_tree.join(rel.to_string());
            if abs.is_file() || abs.is_symlink() {
                std::fs::remove_file(&abs)?;
            }
        }
    }

    Ok(outcome)
}

/// Stage `paths` (spec §4.11 `add`): first `rm` (no delete, tolerant of
/// missing), then hash and record each file that still exists on disk.
/// Directories are expanded to the (non-ignored) files they contain.
pub fn add(repo: &mut Repository, paths: &[PathBuf]) -> Result<AddOutcome, RepoError> {
    let work_tree = repo.work_tree().to_path_buf();

    rm(repo, paths, false, true)?;

    let ignore = build_ignore_engine(repo)?;
    let mut files = Vec::new();
    for p in paths {
        let abs = if p.is_absolute() {
            p.clone()
        } else {
            work_tree.join(p)
        };
        collect_files(&work_tree, &abs, &ignore, &mut files)?;
    }

    let mut outcome = AddOutcome::default();
    for abs in files {
        let rel = repo_relative(&work_tree, &abs)?;
        let data = std::fs::read(&abs)?;
        let oid = repo.odb().write_raw(ObjectType::Blob, &data)?;
        let meta = std::fs::symlink_metadata(&abs)?;
        let mode = file_mode(&meta, &abs)?;

        let entry = IndexEntry {
            path: rel.clone(),
            oid,
            mode,
            stage: Stage::Normal,
            stat: StatData::from_metadata(&meta),
            flags: EntryFlags::default(),
        };
        repo.index_mut()?.add(entry);
        outcome.added.push(rel);
    }

    Ok(outcome)
}

/// Recursively collect regular files under `path` (or just `path` itself if
/// it's a file), skipping anything the ignore engine rejects.
fn collect_files(
    work_tree: &Path,
    path: &Path,
    ignore: &rgit_index::IgnoreEngine,
    out: &mut Vec<PathBuf>,
) -> Result<(), RepoError> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    if meta.file_type().is_dir() {
        if path.join(".git").exists() && path != work_tree {
            return Ok(());
        }
        let mut entries: Vec<_> = std::fs::read_dir(path)?.collect::<Result<_, _>>()?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            collect_files(work_tree, &entry.path(), ignore, out)?;
        }
    } else {
        let rel = repo_relative(work_tree, path)?;
        if !ignore.is_ignored(rel.as_ref(), false) {
            out.push(path.to_path_buf());
        }
    }

    Ok(())
}

/// File mode from on-disk metadata: executable bit on Unix, symlink, else regular.
#[cfg(unix)]
fn file_mode(meta: &std::fs::Metadata, _path: &Path) -> Result<FileMode, RepoError> {
    use std::os::unix::fs::PermissionsExt;
    if meta.file_type().is_symlink() {
        return Ok(FileMode::Symlink);
    }
    let perms = meta.permissions().mode();
    if perms & 0o111 != 0 {
        Ok(FileMode::Executable)
    } else {
        Ok(FileMode::Regular)
    }
}

#[cfg(not(unix))]
fn file_mode(_meta: &std::fs::Metadata, _path: &Path) -> Result<FileMode, RepoError> {
    Ok(FileMode::Regular)
}

/// Compute `path`'s location relative to `work_tree`, rejecting anything
/// that normalizes outside of it (spec §7 `PathOutsideWorktree`).
fn repo_relative(work_tree: &Path, path: &Path) -> Result<BString, RepoError> {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let normalized = normalize_lexically(&abs);
    let work_tree_normalized = normalize_lexically(work_tree);

    let rel = normalized
        .strip_prefix(&work_tree_normalized)
        .map_err(|_| RepoError::PathOutsideWorktree(path.to_path_buf()))?;

    let s = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    Ok(BString::from(s))
}

/// Resolve `.`/`..` components without touching the file system.
fn normalize_lexically(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
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
    fn add_stages_a_single_file() {
        let (dir, mut repo) = init_repo();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();

        let outcome = add(&mut repo, &[PathBuf::from("a.txt")]).unwrap();
        assert_eq!(outcome.added, vec![BString::from("a.txt")]);
        assert!(repo
            .index()
            .unwrap()
            .get(BStr::new("a.txt"), Stage::Normal)
            .is_some());
    }

    #[test]
    fn add_expands_directories_and_skips_gitignore() {
        let (dir, mut repo) = init_repo();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/keep.txt"), b"k").unwrap();
        std::fs::write(dir.path().join("sub/skip.log"), b"s").unwrap();
        std::fs::write(dir.path().join(".gitignore"), b"*.log\n").unwrap();

        add(&mut repo, &[PathBuf::from("sub"), PathBuf::from(".gitignore")]).unwrap();
        let index = repo.index().unwrap();
        assert!(index.get(BStr::new("sub/keep.txt"), Stage::Normal).is_some());
        assert!(index.get(BStr::new("sub/skip.log"), Stage::Normal).is_none());
    }

    #[test]
    fn rm_requires_existing_entry_unless_skip_missing() {
        let (_dir, mut repo) = init_repo();
        let err = rm(&mut repo, &[PathBuf::from("nope.txt")], false, false).unwrap_err();
        assert!(matches!(err, RepoError::UnknownName(_)));

        let outcome = rm(&mut repo, &[PathBuf::from("nope.txt")], false, true).unwrap();
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn rm_deletes_file_when_requested() {
        let (dir, mut repo) = init_repo();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        add(&mut repo, &[PathBuf::from("a.txt")]).unwrap();
        repo.write_index().unwrap();

        rm(&mut repo, &[PathBuf::from("a.txt")], true, false).unwrap();
        assert!(!dir.path().join("a.txt").exists());
        assert!(repo
            .index()
            .unwrap()
            .get(BStr::new("a.txt"), Stage::Normal)
            .is_none());
    }

    #[test]
    fn path_outside_worktree_rejected() {
        let (_dir, mut repo) = init_repo();
        let outside = std::env::temp_dir().join("definitely-outside-repo.txt");
        let err = rm(&mut repo, &[outside], false, true).unwrap_err();
        assert!(matches!(err, RepoError::PathOutsideWorktree(_)));
    }
}
