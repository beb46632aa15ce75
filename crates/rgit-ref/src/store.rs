use rgit_hash::ObjectId;

use crate::error::RefError;
use crate::name::RefName;
use crate::Reference;

/// Minimal reference store surface: resolve, enumerate, create.
///
/// There is no atomic multi-ref transaction API and no reflog — a single
/// ref write is just a loose-file write guarded by a lock file (see
/// `rgit_utils::lockfile`), and last-writer-wins is the whole concurrency
/// story (spec §5).
pub trait RefStore: Send + Sync {
    /// Look up a ref by name and return it unresolved (a symbolic ref stays
    /// symbolic; use `resolve_to_oid` to follow the chain to an OID).
    fn resolve(&self, name: &RefName) -> Result<Option<Reference>, RefError>;

    /// Resolve a ref name all the way to a final OID, following symbolic
    /// chains. Returns `Ok(None)` for a missing or unborn (dangling
    /// symbolic) ref.
    fn resolve_to_oid(&self, name: &RefName) -> Result<Option<ObjectId>, RefError>;

    /// Enumerate all refs under an optional name prefix, sorted by name.
    fn iter(
        &self,
        prefix: Option<&str>,
    ) -> Result<Box<dyn Iterator<Item = Result<Reference, RefError>> + '_>, RefError>;

    /// Create or overwrite a direct ref pointing at `oid`.
    fn create(&self, name: &RefName, oid: &ObjectId) -> Result<(), RefError>;

    /// Create or overwrite a symbolic ref pointing at `target`.
    fn create_symbolic(&self, name: &RefName, target: &RefName) -> Result<(), RefError>;

    /// Delete a ref.
    fn delete(&self, name: &RefName) -> Result<(), RefError>;
}
