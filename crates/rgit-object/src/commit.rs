use bstr::{BStr, BString, ByteSlice};
use rgit_hash::ObjectId;
use rgit_utils::date::Signature;

use crate::kv::KeyValueList;
use crate::ObjectError;

/// A git commit object: an ordered `tree`/`parent*`/`author`/`committer`
/// key-value header followed by a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    kv: KeyValueList,
}

impl Commit {
    /// Build a new commit with the canonical key order: `tree`, then each
    /// `parent` in order, then `author`, then `committer`.
    pub fn new(
        tree: ObjectId,
        parents: &[ObjectId],
        author: &Signature,
        committer: &Signature,
        message: impl Into<BString>,
    ) -> Self {
        let mut kv = KeyValueList::new();
        kv.push("tree", tree.to_hex());
        for parent in parents {
            kv.push("parent", parent.to_hex());
        }
        kv.push("author", author.to_bytes());
        kv.push("committer", committer.to_bytes());
        kv.message = message.into();
        Self { kv }
    }

    /// Parse commit content from raw bytes (no object header).
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let kv = KeyValueList::parse(content)?;
        if kv.get("tree").is_none() {
            return Err(ObjectError::MissingCommitField { field: "tree" });
        }
        if kv.get("author").is_none() {
            return Err(ObjectError::MissingCommitField { field: "author" });
        }
        if kv.get("committer").is_none() {
            return Err(ObjectError::MissingCommitField { field: "committer" });
        }
        Ok(Self { kv })
    }

    /// Serialize commit content to bytes (no object header).
    pub fn serialize_content(&self) -> Vec<u8> {
        self.kv.serialize()
    }

    /// OID of the root tree.
    pub fn tree(&self) -> Result<ObjectId, ObjectError> {
        let hex = self.kv.get("tree").expect("validated at parse time");
        let hex = std::str::from_utf8(hex.as_bytes())
            .map_err(|_| ObjectError::InvalidHeader("non-UTF8 tree OID".into()))?;
        Ok(ObjectId::from_hex(hex)?)
    }

    /// Parent commit OIDs, in insertion order (empty for a root commit).
    pub fn parents(&self) -> Result<Vec<ObjectId>, ObjectError> {
        self.kv
            .get_all("parent")
            .into_iter()
            .map(|v| {
                let hex = std::str::from_utf8(v.as_bytes())
                    .map_err(|_| ObjectError::InvalidHeader("non-UTF8 parent OID".into()))?;
                Ok(ObjectId::from_hex(hex)?)
            })
            .collect()
    }

    /// Author identity and timestamp.
    pub fn author(&self) -> Result<Signature, ObjectError> {
        let raw = self.kv.get("author").expect("validated at parse time");
        Signature::parse(raw).map_err(|e| ObjectError::InvalidSignature(e.to_string()))
    }

    /// Committer identity and timestamp.
    pub fn committer(&self) -> Result<Signature, ObjectError> {
        let raw = self.kv.get("committer").expect("validated at parse time");
        Signature::parse(raw).map_err(|e| ObjectError::InvalidSignature(e.to_string()))
    }

    /// The message body.
    pub fn message(&self) -> &BStr {
        self.kv.message.as_bstr()
    }

    /// First parent (or `None` for a root commit).
    pub fn first_parent(&self) -> Result<Option<ObjectId>, ObjectError> {
        Ok(self.parents()?.into_iter().next())
    }

    /// First line of the message, with `\` and `"` escaped for embedding in
    /// a quoted graph-description label.
    pub fn escaped_summary(&self) -> String {
        let msg = self.message();
        let first_line = match msg.find_byte(b'\n') {
            Some(pos) => &msg[..pos],
            None => &msg[..],
        };
        let text = String::from_utf8_lossy(first_line);
        text.replace('\\', "\\\\").replace('"', "\\\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgit_utils::date::GitDate;

    fn sig(name: &str, email: &str, ts: i64) -> Signature {
        Signature {
            name: BString::from(name),
            email: BString::from(email),
            date: GitDate::new(ts, 0),
        }
    }

    fn sample_commit_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        out.extend_from_slice(b"parent 0000000000000000000000000000000000000001\n");
        out.extend_from_slice(b"author John Doe <john@example.com> 1234567890 +0000\n");
        out.extend_from_slice(b"committer Jane Doe <jane@example.com> 1234567890 +0000\n");
        out.extend_from_slice(b"\n");
        out.extend_from_slice(b"Initial commit\n");
        out
    }

    #[test]
    fn parse_commit() {
        let commit = Commit::parse(&sample_commit_bytes()).unwrap();
        assert_eq!(
            commit.tree().unwrap().to_hex(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(commit.parents().unwrap().len(), 1);
        assert_eq!(commit.author().unwrap().name.as_bytes(), b"John Doe");
        assert_eq!(
            commit.committer().unwrap().email.as_bytes(),
            b"jane@example.com"
        );
        assert_eq!(commit.message().as_bytes(), b"Initial commit\n");
    }

    #[test]
    fn parse_root_commit() {
        let mut data = Vec::new();
        data.extend_from_slice(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        data.extend_from_slice(b"author A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"committer A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"\nroot\n");

        let commit = Commit::parse(&data).unwrap();
        assert!(commit.parents().unwrap().is_empty());
        assert_eq!(commit.first_parent().unwrap(), None);
    }

    #[test]
    fn parse_merge_commit_with_two_parents() {
        let mut data = Vec::new();
        data.extend_from_slice(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        data.extend_from_slice(b"parent 0000000000000000000000000000000000000001\n");
        data.extend_from_slice(b"parent 0000000000000000000000000000000000000002\n");
        data.extend_from_slice(b"author A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"committer A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"\nMerge\n");

        let commit = Commit::parse(&data).unwrap();
        assert_eq!(commit.parents().unwrap().len(), 2);
    }

    #[test]
    fn serialize_roundtrip() {
        let original_bytes = sample_commit_bytes();
        let commit = Commit::parse(&original_bytes).unwrap();
        assert_eq!(commit.serialize_content(), original_bytes);
    }

    #[test]
    fn build_new_commit_matches_field_order() {
        let tree = ObjectId::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
        let parent = ObjectId::from_hex("0000000000000000000000000000000000000001").unwrap();
        let author = sig("A U Thor", "author@example.com", 1000000000);
        let commit = Commit::new(tree, &[parent], &author, &author, "m\n");
        let bytes = commit.serialize_content();
        assert!(bytes.starts_with(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n"));
        let reparsed = Commit::parse(&bytes).unwrap();
        assert_eq!(reparsed.tree().unwrap(), tree);
        assert_eq!(reparsed.parents().unwrap(), vec![parent]);
    }

    #[test]
    fn missing_tree_errors() {
        let data = b"author A <a@b.com> 1000000000 +0000\ncommitter A <a@b.com> 1000000000 +0000\n\nmsg\n";
        assert!(Commit::parse(data).is_err());
    }

    #[test]
    fn escaped_summary_strips_quotes_and_backslashes() {
        let mut data = Vec::new();
        data.extend_from_slice(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        data.extend_from_slice(b"author A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"committer A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"\nsay \"hi\" and C:\\path\nsecond line\n");
        let commit = Commit::parse(&data).unwrap();
        assert_eq!(commit.escaped_summary(), r#"say \"hi\" and C:\\path"#);
    }
}
