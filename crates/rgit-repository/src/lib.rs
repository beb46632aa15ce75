//! Repository discovery, initialization, and central access for all git subsystems.
//!
//! Ties together the object database, reference store, index, and config for
//! a single non-bare repository, and hosts the cross-subsystem algorithms
//! that don't belong to any one of them: name resolution, status, checkout,
//! and the index mutators `add`/`rm`.

mod discover;
mod error;
mod init;
mod mutate;
mod resolve;
mod status;

pub use error::RepoError;
pub use mutate::{add, rm, AddOutcome, RmOutcome};
pub use resolve::{resolve_name, resolve_to_type, ResolvedKind};
pub use status::{build_ignore_engine, status, Status, StatusEntry};

use std::path::{Path, PathBuf};

use rgit_config::ConfigSet;
use rgit_hash::ObjectId;
use rgit_index::Index;
use rgit_object::{Commit, Object, ObjectType};
use rgit_odb::ObjectDatabase;
use rgit_ref::{FilesRefStore, RefName, RefStore, Reference};
use rgit_utils::date::{GitDate, Signature};

/// The central repository handle tying every subsystem together.
pub struct Repository {
    /// Path to the `.git` directory.
    git_dir: PathBuf,
    /// Path to the working tree (this crate only supports non-bare repos).
    work_tree: PathBuf,
    /// Object database.
    odb: ObjectDatabase,
    /// Reference store.
    refs: FilesRefStore,
    /// Merged configuration (global then repo-local, spec §10.3).
    config: ConfigSet,
    /// Index (lazy-loaded). `None` means not yet loaded from disk.
    index: Option<Index>,
    /// Path to the index file.
    index_path: PathBuf,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("git_dir", &self.git_dir)
            .field("work_tree", &self.work_tree)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Open an existing repository, discovering the root by ascending from `path`.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let git_dir = discover::find_root(path.as_ref(), true)?
            .expect("find_root returns Some when required");
        Self::open_git_dir(git_dir)
    }

    /// Initialize a new repository at `path` (creating its worktree if needed).
    pub fn init(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let git_dir = init::create(path.as_ref())?;
        Self::open_git_dir(git_dir)
    }

    fn open_git_dir(git_dir: PathBuf) -> Result<Self, RepoError> {
        let work_tree = git_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let config = ConfigSet::load(Some(&git_dir))?;

        match config.get_int("core.repositoryformatversion")? {
            Some(0) | None => {}
            Some(other) => return Err(RepoError::UnsupportedFormatVersion(other as u32)),
        }

        let odb = ObjectDatabase::open(git_dir.join("objects"));
        let refs = FilesRefStore::new(&git_dir);
        let index_path = git_dir.join("index");

        Ok(Repository {
            git_dir,
            work_tree,
            odb,
            refs,
            config,
            index: None,
            index_path,
        })
    }

    // --- Path accessors ---

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    // --- Subsystem accessors ---

    pub fn odb(&self) -> &ObjectDatabase {
        &self.odb
    }

    pub fn refs(&self) -> &FilesRefStore {
        &self.refs
    }

    pub fn config(&self) -> &ConfigSet {
        &self.config
    }

    /// Access the index (lazy-loaded).
    pub fn index(&mut self) -> Result<&Index, RepoError> {
        if self.index.is_none() {
            self.load_index()?;
        }
        Ok(self.index.as_ref().unwrap())
    }

    /// Access the index mutably (lazy-loaded).
    pub fn index_mut(&mut self) -> Result<&mut Index, RepoError> {
        if self.index.is_none() {
            self.load_index()?;
        }
        Ok(self.index.as_mut().unwrap())
    }

    /// Replace the cached index with the given one.
    pub fn set_index(&mut self, index: Index) {
        self.index = Some(index);
    }

    /// Write the current in-memory index back to disk.
    pub fn write_index(&self) -> Result<(), RepoError> {
        if let Some(ref idx) = self.index {
            idx.write_to(&self.index_path)?;
        }
        Ok(())
    }

    /// Reload the index from disk, replacing any cached copy.
    pub fn reload_index(&mut self) -> Result<&Index, RepoError> {
        self.index = None;
        self.load_index()?;
        Ok(self.index.as_ref().unwrap())
    }

    fn load_index(&mut self) -> Result<(), RepoError> {
        let idx = if self.index_path.exists() {
            Index::read_from(&self.index_path)?
        } else {
            Index::new()
        };
        self.index = Some(idx);
        Ok(())
    }

    // --- HEAD / branch convenience ---

    /// Resolve HEAD to an OID.
    pub fn head_oid(&self) -> Result<Option<ObjectId>, RepoError> {
        let head_ref = RefName::new_unchecked("HEAD");
        Ok(self.refs.resolve_to_oid(&head_ref)?)
    }

    /// The current branch name (`None` if detached HEAD).
    pub fn current_branch(&self) -> Result<Option<String>, RepoError> {
        let head_ref = RefName::new_unchecked("HEAD");
        match self.refs.resolve(&head_ref)? {
            Some(Reference::Symbolic { target, .. }) => {
                let name = target.as_str();
                let branch = name.strip_prefix("refs/heads/").unwrap_or(name);
                Ok(Some(branch.to_string()))
            }
            Some(Reference::Direct { .. }) => Ok(None),
            None => Ok(None),
        }
    }

    /// Whether HEAD is unborn (symbolic, pointing at a branch with no commits yet).
    pub fn is_unborn(&self) -> Result<bool, RepoError> {
        let head_ref = RefName::new_unchecked("HEAD");
        match self.refs.resolve(&head_ref)? {
            Some(Reference::Symbolic { target, .. }) => {
                Ok(self.refs.resolve_to_oid(&target)?.is_none())
            }
            Some(Reference::Direct { .. }) => Ok(false),
            None => Ok(true),
        }
    }

    /// The configured user identity (`user.name`/`user.email`), or
    /// `ConfigMissing` if either is absent (spec §11: no passwd-database
    /// fallback in this core).
    pub fn identity(&self) -> Result<(String, String), RepoError> {
        let name = self
            .config
            .get_string("user.name")?
            .ok_or_else(|| RepoError::ConfigMissing("user.name".into()))?;
        let email = self
            .config
            .get_string("user.email")?
            .ok_or_else(|| RepoError::ConfigMissing("user.email".into()))?;
        Ok((name, email))
    }

    // --- Commit / checkout (spec §4.9) ---

    /// Build and write a commit object from the given tree and parents.
    ///
    /// Does not touch any ref; callers advance HEAD/branch separately.
    pub fn commit_create(
        &self,
        tree: ObjectId,
        parents: &[ObjectId],
        message: impl Into<bstr::BString>,
    ) -> Result<ObjectId, RepoError> {
        let (name, email) = self.identity()?;
        let sig = Signature {
            name: bstr::BString::from(name),
            email: bstr::BString::from(email),
            date: GitDate::now(),
        };
        let commit = Commit::new(tree, parents, &sig, &sig, message);
        let oid = self
            .odb
            .write_raw(ObjectType::Commit, &commit.serialize_content())?;
        Ok(oid)
    }

    /// Advance the current branch (or HEAD directly, if detached) to `oid`
    /// after a new commit is created (spec §9 open question 3).
    pub fn advance_head(&self, oid: ObjectId) -> Result<(), RepoError> {
        let head_ref = RefName::new_unchecked("HEAD");
        match self.refs.resolve(&head_ref)? {
            Some(Reference::Symbolic { target, .. }) => {
                self.refs.create(&target, &oid)?;
            }
            _ => {
                self.refs.create(&head_ref, &oid)?;
            }
        }
        Ok(())
    }

    /// Materialize `oid` (a commit or tree) into `path`, which must be
    /// absent or empty (spec §4.9 `checkout`).
    pub fn checkout(&self, oid: ObjectId, path: &Path) -> Result<(), RepoError> {
        if path.exists() {
            let mut entries = std::fs::read_dir(path)?;
            if entries.next().is_some() {
                return Err(RepoError::TargetNotEmpty(path.to_path_buf()));
            }
        } else {
            std::fs::create_dir_all(path)?;
        }

        let tree_oid = match self.odb.read(&oid)? {
            Object::Tree(_) => oid,
            Object::Commit(c) => c.tree()?,
            other => {
                return Err(RepoError::CannotCoerce {
                    oid,
                    from: other.object_type(),
                    to: "tree",
                })
            }
        };

        self.checkout_tree(tree_oid, path)
    }

    fn checkout_tree(&self, tree_oid: ObjectId, dir: &Path) -> Result<(), RepoError> {
        let tree = match self.odb.read(&tree_oid)? {
            Object::Tree(t) => t,
            _ => unreachable!("caller only passes tree OIDs"),
        };

        for entry in tree.iter() {
            let entry_path = dir.join(entry.name.to_string());
            if entry.mode.is_tree() {
                std::fs::create_dir_all(&entry_path)?;
                self.checkout_tree(entry.oid, &entry_path)?;
            } else {
                let blob = match self.odb.read(&entry.oid)? {
                    Object::Blob(b) => b,
                    other => {
                        return Err(RepoError::CannotCoerce {
                            oid: entry.oid,
                            from: other.object_type(),
                            to: "blob",
                        })
                    }
                };
                std::fs::write(&entry_path, &blob.data)?;
            }
        }
        Ok(())
    }
}
