//! Repository location (spec §4.1): ascend ancestors for the first `.git`.

use std::path::{Path, PathBuf};

use crate::RepoError;

/// Ascend from `start` (inclusive) until a directory containing a `.git`
/// subdirectory is found. Returns the `.git` directory's path.
///
/// `required` controls whether a miss is an error (`true`, per spec §4.1)
/// or reported as `Ok(None)` for callers that probe optimistically.
pub fn find_root(start: &Path, required: bool) -> Result<Option<PathBuf>, RepoError> {
    let mut dir = std::fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());

    loop {
        let candidate = dir.join(".git");
        if candidate.is_dir() {
            return Ok(Some(candidate));
        }

        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => {
                return if required {
                    Err(RepoError::NotARepository(start.to_path_buf()))
                } else {
                    Ok(None)
                }
            }
        }
    }
}
