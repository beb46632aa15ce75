//! Object database: a thin, loose-objects-only read/write/resolve layer.
//!
//! Packfiles, alternates, and an in-memory object cache are out of scope —
//! every object lives as exactly one zlib-compressed loose file under
//! `objects/<xx>/<38hex>` (spec §3, §5).

mod prefix;

use std::path::{Path, PathBuf};

use rgit_hash::ObjectId;
use rgit_loose::{LooseError, LooseObjectStore};
use rgit_object::{Object, ObjectType};

pub use prefix::{resolve_prefix, PrefixResolution, MINIMUM_ABBREV};

/// Errors from object database operations.
#[derive(Debug, thiserror::Error)]
pub enum OdbError {
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("ambiguous object prefix {prefix:?}: matches {count} objects")]
    AmbiguousPrefix { prefix: String, count: usize },

    #[error(transparent)]
    Loose(#[from] LooseError),

    #[error(transparent)]
    Object(#[from] rgit_object::ObjectError),

    #[error(transparent)]
    Hash(#[from] rgit_hash::HashError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The object database: a loose object store plus OID-prefix resolution.
pub struct ObjectDatabase {
    loose: LooseObjectStore,
    objects_dir: PathBuf,
}

impl ObjectDatabase {
    /// Open an object database rooted at `objects_dir` (typically `<git_dir>/objects`).
    pub fn open(objects_dir: impl AsRef<Path>) -> Self {
        let objects_dir = objects_dir.as_ref().to_path_buf();
        let loose = LooseObjectStore::open(&objects_dir);
        Self { loose, objects_dir }
    }

    /// Root `objects/` directory.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Read and parse an object by its exact OID.
    pub fn read(&self, oid: &ObjectId) -> Result<Object, OdbError> {
        self.loose
            .read(oid)?
            .ok_or_else(|| OdbError::NotFound(*oid))
    }

    /// Read only the object's type and content size, without fully decompressing the body.
    pub fn read_header(&self, oid: &ObjectId) -> Result<(ObjectType, usize), OdbError> {
        self.loose
            .read_header(oid)?
            .ok_or_else(|| OdbError::NotFound(*oid))
    }

    /// Does an object with this exact OID exist?
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.loose.contains(oid)
    }

    /// Serialize and write an object, returning its computed OID.
    ///
    /// Writes are idempotent: if the object already exists on disk, the
    /// write is a no-op and the existing OID is returned.
    pub fn write(&self, object: &Object) -> Result<ObjectId, OdbError> {
        Ok(self.loose.write(object)?)
    }

    /// Write raw content under a known type, returning the computed OID.
    pub fn write_raw(&self, obj_type: ObjectType, content: &[u8]) -> Result<ObjectId, OdbError> {
        Ok(self.loose.write_raw(obj_type, content)?)
    }

    /// Resolve a hex OID prefix to a unique object, per spec §4.5 rule 3.
    pub fn resolve_prefix(&self, prefix: &str) -> Result<PrefixResolution, OdbError> {
        prefix::resolve_prefix(&self.loose, prefix)
    }

    /// Iterate every OID present in the loose object store.
    pub fn iter_all_oids(&self) -> Result<impl Iterator<Item = Result<ObjectId, OdbError>>, OdbError> {
        Ok(self.loose.iter()?.map(|r| r.map_err(OdbError::from)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgit_object::Blob;

    fn test_odb() -> (tempfile::TempDir, ObjectDatabase) {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path().join("objects"));
        (dir, odb)
    }

    #[test]
    fn write_then_read_blob() {
        let (_dir, odb) = test_odb();
        let blob = Object::Blob(Blob::new(b"hello world".to_vec()));
        let oid = odb.write(&blob).unwrap();
        assert!(odb.contains(&oid));

        let read_back = odb.read(&oid).unwrap();
        match read_back {
            Object::Blob(b) => assert_eq!(b.data, b"hello world"),
            _ => panic!("expected blob"),
        }
    }

    #[test]
    fn missing_object_errors() {
        let (_dir, odb) = test_odb();
        let oid = ObjectId::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
        assert!(!odb.contains(&oid));
        assert!(odb.read(&oid).is_err());
    }
}
