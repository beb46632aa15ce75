//! Index file writing (spec §4.6, §6): v2 header, packed entries, trailing checksum.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use bstr::{BString, ByteSlice};
use rgit_hash::hasher::Hasher;
use rgit_object::{FileMode, ObjectType, Tree, TreeEntry};
use rgit_odb::ObjectDatabase;
use rgit_utils::lockfile::LockFile;

use crate::entry::IndexEntry;
use crate::{Index, IndexError, Stage};

const INDEX_SIGNATURE: &[u8; 4] = b"DIRC";

/// Write the index to `path` atomically using a lock file.
pub fn write_index(index: &Index, path: &Path) -> Result<(), IndexError> {
    let mut lock = LockFile::acquire(path).map_err(|_| IndexError::InvalidHeader(
        format!("unable to lock {}", path.display()),
    ))?;

    let data = serialize_index(index);
    lock.write_all(&data)?;
    lock.commit().map_err(|_| IndexError::InvalidHeader(
        format!("unable to commit {}", path.display()),
    ))?;

    Ok(())
}

/// Serialize the index to bytes: header, packed entries, trailing SHA-1
/// checksum of everything before it (spec §9 open question: always emit it).
fn serialize_index(index: &Index) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.extend_from_slice(INDEX_SIGNATURE);
    buf.extend_from_slice(&2u32.to_be_bytes());
    buf.extend_from_slice(&(index.len() as u32).to_be_bytes());

    for entry in index.iter() {
        write_entry(&mut buf, entry);
    }

    let checksum = Hasher::digest(&buf).expect("index checksum must not collide");
    buf.extend_from_slice(checksum.as_bytes());

    buf
}

/// Write a single v2 entry: 62-byte fixed prefix, name, NUL, padding to an
/// 8-byte boundary measured from the entry's start (spec §4.6).
fn write_entry(buf: &mut Vec<u8>, entry: &IndexEntry) {
    let entry_start = buf.len();

    buf.extend_from_slice(&entry.stat.ctime_secs.to_be_bytes());
    buf.extend_from_slice(&entry.stat.ctime_nsecs.to_be_bytes());
    buf.extend_from_slice(&entry.stat.mtime_secs.to_be_bytes());
    buf.extend_from_slice(&entry.stat.mtime_nsecs.to_be_bytes());
    buf.extend_from_slice(&entry.stat.dev.to_be_bytes());
    buf.extend_from_slice(&entry.stat.ino.to_be_bytes());

    let mode_type: u16 = match entry.mode {
        FileMode::Regular | FileMode::Executable => 0b1000,
        FileMode::Symlink => 0b1010,
        FileMode::Gitlink => 0b1110,
        FileMode::Tree | FileMode::Unknown(_) => 0b1000,
    };
    let mode_perms: u16 = (entry.mode.raw() & 0o777) as u16;
    let mode_field: u16 = (mode_type << 12) | mode_perms;
    buf.extend_from_slice(&mode_field.to_be_bytes());

    buf.extend_from_slice(&entry.stat.uid.to_be_bytes());
    buf.extend_from_slice(&entry.stat.gid.to_be_bytes());
    buf.extend_from_slice(&entry.stat.size.to_be_bytes());
    buf.extend_from_slice(entry.oid.as_bytes());

    let name_len = std::cmp::min(entry.path.len(), 0xFFF) as u16;
    let mut flags: u16 = name_len;
    flags |= (entry.stage.as_u8() as u16) << 12;
    if entry.flags.assume_valid {
        flags |= 0x8000;
    }
    buf.extend_from_slice(&flags.to_be_bytes());

    buf.extend_from_slice(&entry.path);
    buf.push(0);
    if entry.path.len() >= 0xFFF {
        // Oversized names terminate with the NUL above; no further padding
        // alignment guarantee is required by readers (spec §4.6, §9).
    }

    let written = buf.len() - entry_start;
    let padded = (written + 7) & !7;
    for _ in written..padded {
        buf.push(0);
    }
}

/// Build the tree hierarchy for the index's stage-0 entries and write every
/// tree object (spec §4.8): group by `dirname`, build deepest directories
/// first, iteratively (no recursion, per spec §9).
pub fn write_tree_from_index(index: &Index, odb: &ObjectDatabase) -> Result<rgit_hash::ObjectId, IndexError> {
    let entries: Vec<&IndexEntry> = index.iter().filter(|e| e.stage == Stage::Normal).collect();

    if entries.is_empty() {
        let tree = Tree::new();
        return Ok(odb.write_raw(ObjectType::Tree, &tree.serialize_content())?);
    }

    // Group blob entries by their containing directory, and make sure every
    // ancestor directory down to the root has a (possibly empty) bucket.
    let mut buckets: BTreeMap<BString, Vec<TreeEntry>> = BTreeMap::new();
    buckets.entry(BString::from("")).or_default();

    for entry in &entries {
        let dir = dirname_of(&entry.path);
        ensure_ancestors(&mut buckets, &dir);
        buckets.entry(dir).or_default().push(TreeEntry {
            mode: entry.mode,
            name: basename_of(&entry.path),
            oid: entry.oid,
        });
    }

    // Deepest directories first so a parent's subtree entry is ready before
    // the parent itself is built.
    let mut dirs: Vec<BString> = buckets.keys().cloned().collect();
    dirs.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut built: BTreeMap<BString, rgit_hash::ObjectId> = BTreeMap::new();
    let mut root_oid = None;

    for dir in &dirs {
        let mut tree_entries = buckets.remove(dir).unwrap_or_default();

        // Fold in subtrees already built for this directory's children.
        let mut children: Vec<BString> = built
            .keys()
            .filter(|child| dirname_of(child).as_slice() == dir.as_slice())
            .cloned()
            .collect();
        children.sort();
        for child in children {
            let oid = built.remove(&child).expect("just filtered from built");
            tree_entries.push(TreeEntry {
                mode: FileMode::Tree,
                name: basename_of(&child),
                oid,
            });
        }

        let mut tree = Tree::new();
        tree.entries = tree_entries;
        tree.sort();
        let oid = odb.write_raw(ObjectType::Tree, &tree.serialize_content())?;

        if dir.is_empty() {
            root_oid = Some(oid);
        } else {
            built.insert(dir.clone(), oid);
        }
    }

    Ok(root_oid.expect("root bucket (\"\") always present"))
}

/// Insert an empty bucket for every ancestor of `dir`, from `dir` itself up
/// to (and including) the root.
fn ensure_ancestors(buckets: &mut BTreeMap<BString, Vec<TreeEntry>>, dir: &BString) {
    let mut current = dir.clone();
    loop {
        buckets.entry(current.clone()).or_default();
        if current.is_empty() {
            break;
        }
        current = dirname_of(&current);
    }
}

/// `dirname(path)`, returning `""` for a top-level path (spec represents the
/// root directory's key as the empty string, not `"."`).
fn dirname_of(path: &[u8]) -> BString {
    match path.rfind_byte(b'/') {
        Some(pos) => BString::from(&path[..pos]),
        None => BString::from(""),
    }
}

fn basename_of(path: &[u8]) -> BString {
    match path.rfind_byte(b'/') {
        Some(pos) => BString::from(&path[pos + 1..]),
        None => BString::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryFlags, StatData};
    use rgit_hash::ObjectId;

    fn test_odb() -> (tempfile::TempDir, ObjectDatabase) {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectDatabase::open(dir.path().join("objects"));
        (dir, odb)
    }

    fn mk_entry(path: &str, oid: ObjectId) -> IndexEntry {
        IndexEntry {
            path: BString::from(path),
            oid,
            mode: FileMode::Regular,
            stage: Stage::Normal,
            stat: StatData::default(),
            flags: EntryFlags::default(),
        }
    }

    #[test]
    fn empty_index_produces_empty_tree() {
        let (_dir, odb) = test_odb();
        let index = Index::new();
        let oid = write_tree_from_index(&index, &odb).unwrap();
        assert_eq!(oid.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }

    #[test]
    fn single_top_level_file() {
        let (_dir, odb) = test_odb();
        let blob_oid = odb.write_raw(ObjectType::Blob, b"A").unwrap();
        let mut index = Index::new();
        index.add(mk_entry("a.txt", blob_oid));

        let tree_oid = write_tree_from_index(&index, &odb).unwrap();
        let tree = match odb.read(&tree_oid).unwrap() {
            rgit_object::Object::Tree(t) => t,
            _ => panic!("expected tree"),
        };
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.entries[0].name, "a.txt");
        assert_eq!(tree.entries[0].oid, blob_oid);
    }

    #[test]
    fn nested_directories_build_deepest_first() {
        let (_dir, odb) = test_odb();
        let blob_oid = odb.write_raw(ObjectType::Blob, b"x").unwrap();
        let mut index = Index::new();
        index.add(mk_entry("a/b/c.txt", blob_oid));
        index.add(mk_entry("a/d.txt", blob_oid));

        let root_oid = write_tree_from_index(&index, &odb).unwrap();
        let root = match odb.read(&root_oid).unwrap() {
            rgit_object::Object::Tree(t) => t,
            _ => panic!("expected tree"),
        };
        assert_eq!(root.len(), 1);
        assert_eq!(root.entries[0].name, "a");

        let a_tree = match odb.read(&root.entries[0].oid).unwrap() {
            rgit_object::Object::Tree(t) => t,
            _ => panic!("expected tree"),
        };
        assert_eq!(a_tree.len(), 2);
        assert!(a_tree.find(bstr::BStr::new("d.txt")).is_some());
        assert!(a_tree.find(bstr::BStr::new("b")).is_some());
    }
}
