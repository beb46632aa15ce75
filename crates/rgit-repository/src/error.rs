use std::path::PathBuf;

use rgit_hash::ObjectId;
use rgit_object::ObjectType;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a git repository (or any of the parent directories): {0}")]
    NotARepository(PathBuf),

    #[error("repository already exists: {0}")]
    TargetNotEmpty(PathBuf),

    #[error("config missing: {0}")]
    ConfigMissing(String),

    #[error("unsupported repository format version {0}")]
    UnsupportedFormatVersion(u32),

    #[error("ambiguous name {name:?}: {} matching objects: {}", candidates.len(), format_candidates(candidates))]
    AmbiguousName {
        name: String,
        candidates: Vec<ObjectId>,
    },

    #[error("unknown name: {0}")]
    UnknownName(String),

    #[error("path outside worktree: {0}")]
    PathOutsideWorktree(PathBuf),

    #[error("not a file: {0}")]
    NotAFile(PathBuf),

    #[error("cannot coerce {oid} ({from}) to {to}")]
    CannotCoerce {
        oid: ObjectId,
        from: ObjectType,
        to: &'static str,
    },

    #[error(transparent)]
    Config(#[from] rgit_config::ConfigError),

    #[error(transparent)]
    Odb(#[from] rgit_odb::OdbError),

    #[error(transparent)]
    Object(#[from] rgit_object::ObjectError),

    #[error(transparent)]
    Ref(#[from] rgit_ref::RefError),

    #[error(transparent)]
    Index(#[from] rgit_index::IndexError),

    #[error(transparent)]
    Hash(#[from] rgit_hash::HashError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_candidates(candidates: &[ObjectId]) -> String {
    candidates
        .iter()
        .map(ObjectId::to_hex)
        .collect::<Vec<_>>()
        .join(", ")
}
