//! Repository creation (spec §4.1 `create`).

use std::fs;
use std::path::{Path, PathBuf};

use crate::RepoError;

const CONFIG_TEMPLATE: &str = "[core]\n\trepositoryformatversion = 0\n\tfilemode = false\n\tbare = false\n";
const DESCRIPTION_TEMPLATE: &str =
    "Unnamed repository; edit this file 'description' to name the repository.\n";
const HEAD_TEMPLATE: &str = "ref: refs/heads/master\n";

/// Create a new repository's `.git` directory at `path`.
///
/// The worktree must be absent or empty (spec §4.1, §7 `TargetNotEmpty`).
/// Returns the path to the created `.git` directory.
pub fn create(path: &Path) -> Result<PathBuf, RepoError> {
    if path.exists() {
        let mut entries = fs::read_dir(path)?;
        if entries.next().is_some() {
            return Err(RepoError::TargetNotEmpty(path.to_path_buf()));
        }
    } else {
        fs::create_dir_all(path)?;
    }

    let git_dir = path.join(".git");
    fs::create_dir_all(git_dir.join("branches"))?;
    fs::create_dir_all(git_dir.join("objects"))?;
    fs::create_dir_all(git_dir.join("refs/tags"))?;
    fs::create_dir_all(git_dir.join("refs/heads"))?;

    fs::write(git_dir.join("description"), DESCRIPTION_TEMPLATE)?;
    fs::write(git_dir.join("HEAD"), HEAD_TEMPLATE)?;
    fs::write(git_dir.join("config"), CONFIG_TEMPLATE)?;

    Ok(git_dir)
}
