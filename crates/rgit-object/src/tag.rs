use bstr::{BStr, BString};
use rgit_hash::ObjectId;
use rgit_utils::date::Signature;

use crate::kv::KeyValueList;
use crate::{ObjectError, ObjectType};

/// A git annotated tag object: `object`/`type`/`tag`/`tagger` key-value
/// header followed by a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    kv: KeyValueList,
}

impl Tag {
    /// Build a new annotated tag pointing at `target`.
    pub fn new(
        target: ObjectId,
        target_type: ObjectType,
        tag_name: impl Into<BString>,
        tagger: &Signature,
        message: impl Into<BString>,
    ) -> Self {
        let mut kv = KeyValueList::new();
        kv.push("object", target.to_hex());
        kv.push("type", target_type.as_bytes());
        kv.push("tag", tag_name.into());
        kv.push("tagger", tagger.to_bytes());
        kv.message = message.into();
        Self { kv }
    }

    /// Parse tag content from raw bytes (no object header).
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let kv = KeyValueList::parse(content)?;
        if kv.get("object").is_none() {
            return Err(ObjectError::MissingTagField { field: "object" });
        }
        if kv.get("type").is_none() {
            return Err(ObjectError::MissingTagField { field: "type" });
        }
        if kv.get("tag").is_none() {
            return Err(ObjectError::MissingTagField { field: "tag" });
        }
        Ok(Self { kv })
    }

    /// Serialize tag content to bytes (no object header).
    pub fn serialize_content(&self) -> Vec<u8> {
        self.kv.serialize()
    }

    /// OID of the tagged object.
    pub fn target(&self) -> Result<ObjectId, ObjectError> {
        let hex = self.kv.get("object").expect("validated at parse time");
        let hex = std::str::from_utf8(hex.as_bytes())
            .map_err(|_| ObjectError::InvalidHeader("non-UTF8 target OID".into()))?;
        Ok(ObjectId::from_hex(hex)?)
    }

    /// Type of the tagged object.
    pub fn target_type(&self) -> Result<ObjectType, ObjectError> {
        let ty = self.kv.get("type").expect("validated at parse time");
        ObjectType::from_bytes(ty.as_bytes())
    }

    /// The tag's own name.
    pub fn tag_name(&self) -> &BStr {
        self.kv.get("tag").expect("validated at parse time")
    }

    /// Tagger identity and timestamp, if present (older tags may omit it).
    pub fn tagger(&self) -> Result<Option<Signature>, ObjectError> {
        match self.kv.get("tagger") {
            Some(raw) => Ok(Some(
                Signature::parse(raw).map_err(|e| ObjectError::InvalidSignature(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// The tag message.
    pub fn message(&self) -> &BStr {
        use bstr::ByteSlice;
        self.kv.message.as_bstr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tag_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"object da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        out.extend_from_slice(b"type commit\n");
        out.extend_from_slice(b"tag v1.0\n");
        out.extend_from_slice(b"tagger John Doe <john@example.com> 1234567890 +0000\n");
        out.extend_from_slice(b"\n");
        out.extend_from_slice(b"Release v1.0\n");
        out
    }

    #[test]
    fn parse_tag() {
        let tag = Tag::parse(&sample_tag_bytes()).unwrap();
        assert_eq!(
            tag.target().unwrap().to_hex(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(tag.target_type().unwrap(), ObjectType::Commit);
        assert_eq!(tag.tag_name().as_bytes(), b"v1.0");
        assert!(tag.tagger().unwrap().is_some());
        assert_eq!(tag.message().as_bytes(), b"Release v1.0\n");
    }

    #[test]
    fn parse_tag_without_tagger() {
        let mut data = Vec::new();
        data.extend_from_slice(b"object da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        data.extend_from_slice(b"type commit\n");
        data.extend_from_slice(b"tag old-tag\n");
        data.extend_from_slice(b"\nOld tag\n");

        let tag = Tag::parse(&data).unwrap();
        assert!(tag.tagger().unwrap().is_none());
        assert_eq!(tag.tag_name().as_bytes(), b"old-tag");
    }

    #[test]
    fn serialize_roundtrip() {
        let original_bytes = sample_tag_bytes();
        let tag = Tag::parse(&original_bytes).unwrap();
        assert_eq!(tag.serialize_content(), original_bytes);
    }

    #[test]
    fn tag_pointing_to_tree() {
        let mut data = Vec::new();
        data.extend_from_slice(b"object da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        data.extend_from_slice(b"type tree\n");
        data.extend_from_slice(b"tag tree-tag\n");
        data.extend_from_slice(b"\n");

        let tag = Tag::parse(&data).unwrap();
        assert_eq!(tag.target_type().unwrap(), ObjectType::Tree);
    }

    #[test]
    fn missing_object_errors() {
        let data = b"type commit\ntag v1.0\n\nmessage\n";
        assert!(Tag::parse(data).is_err());
    }
}
