use bstr::{BStr, BString, ByteSlice};

use crate::ObjectError;

/// An ordered key-value header list plus a message body, as used by both
/// commit and tag objects.
///
/// Keys may repeat (a commit may have several `parent` lines); entries are
/// kept in insertion order rather than collapsed into a map so that
/// serialization reproduces the original byte order. Embedded newlines in a
/// value are folded on the wire by prefixing continuation lines with a
/// single space.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyValueList {
    pub entries: Vec<(BString, BString)>,
    pub message: BString,
}

impl KeyValueList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header entry, preserving insertion order (duplicates allowed).
    pub fn push(&mut self, key: impl Into<BString>, value: impl Into<BString>) {
        self.entries.push((key.into(), value.into()));
    }

    /// The value of the first entry matching `key`, if any.
    pub fn get(&self, key: &str) -> Option<&BStr> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_slice() == key.as_bytes())
            .map(|(_, v)| v.as_bstr())
    }

    /// All values for entries matching `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> Vec<&BStr> {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_slice() == key.as_bytes())
            .map(|(_, v)| v.as_bstr())
            .collect()
    }

    /// Parse the key-value-list wire format: a run of `key SP value\n` lines
    /// (continuation lines folded back from `\n ` to `\n`), followed by a
    /// blank line and the message body.
    pub fn parse(data: &[u8]) -> Result<Self, ObjectError> {
        let mut entries = Vec::new();
        let mut pos = 0;

        loop {
            if pos >= data.len() {
                break;
            }

            let space = data[pos..].iter().position(|&b| b == b' ').map(|p| p + pos);
            let newline = data[pos..].iter().position(|&b| b == b'\n').map(|p| p + pos);

            let is_message_start = match (space, newline) {
                (Some(s), Some(n)) => n < s,
                (None, _) => true,
                (Some(_), None) => false,
            };

            if is_message_start {
                // A blank line (bare '\n') separates headers from the message;
                // an empty remainder with no headers means no message at all.
                if newline == Some(pos) {
                    pos += 1;
                }
                break;
            }

            let space = space.unwrap();
            let key = BString::from(&data[pos..space]);

            // The value runs to the next '\n' that is NOT followed by a space
            // (that would be a continuation line).
            let mut line_end = newline.unwrap();
            while line_end + 1 < data.len() && data[line_end + 1] == b' ' {
                let next = data[line_end + 1..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map(|p| p + line_end + 1)
                    .ok_or_else(|| {
                        ObjectError::InvalidHeader("unterminated continuation line".into())
                    })?;
                line_end = next;
            }

            let raw_value = &data[space + 1..line_end];
            let value = unfold(raw_value);
            entries.push((key, value));
            pos = line_end + 1;
        }

        let message = BString::from(&data[pos..]);
        Ok(Self { entries, message })
    }

    /// Serialize back to the wire format: each entry as `key SP fold(value)\n`,
    /// then a blank line and the message.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, value) in &self.entries {
            out.extend_from_slice(key);
            out.push(b' ');
            out.extend_from_slice(&fold(value));
            out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }
}

/// `\n ` -> `\n` (continuation unfolding, on read).
fn unfold(value: &[u8]) -> BString {
    let mut out = Vec::with_capacity(value.len());
    let mut i = 0;
    while i < value.len() {
        out.push(value[i]);
        if value[i] == b'\n' {
            // The caller already stripped stray continuation markers from
            // the raw slice boundaries; any embedded "\n " here is a fold.
            if i + 1 < value.len() && value[i + 1] == b' ' {
                i += 1;
            }
        }
        i += 1;
    }
    BString::from(out)
}

/// `\n` -> `\n ` (continuation folding, on write).
fn fold(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for &b in value {
        out.push(b);
        if b == b'\n' {
            out.push(b' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        let data = b"tree abc\nparent def\nauthor A\ncommitter B\n\nmessage body\n";
        let kv = KeyValueList::parse(data).unwrap();
        assert_eq!(kv.get("tree").unwrap().as_bytes(), b"abc");
        assert_eq!(kv.get("parent").unwrap().as_bytes(), b"def");
        assert_eq!(kv.message.as_bytes(), b"message body\n");
    }

    #[test]
    fn duplicate_keys_preserve_order() {
        let data = b"tree abc\nparent p1\nparent p2\nauthor A\ncommitter B\n\nmsg\n";
        let kv = KeyValueList::parse(data).unwrap();
        let parents = kv.get_all("parent");
        assert_eq!(parents, vec![BStr::new(b"p1"), BStr::new(b"p2")]);
    }

    #[test]
    fn continuation_unfold_and_fold_roundtrip() {
        let mut kv = KeyValueList::new();
        kv.push("gpgsig", "line one\nline two\nline three");
        kv.message = BString::from("msg\n");
        let serialized = kv.serialize();
        let reparsed = KeyValueList::parse(&serialized).unwrap();
        assert_eq!(
            reparsed.get("gpgsig").unwrap().as_bytes(),
            b"line one\nline two\nline three"
        );
    }

    #[test]
    fn no_message_after_headers() {
        let data = b"tree abc\nauthor A\ncommitter B\n\n";
        let kv = KeyValueList::parse(data).unwrap();
        assert!(kv.message.is_empty());
    }

    #[test]
    fn serialize_then_parse_is_identity() {
        let data = b"tree abc\nparent p1\nparent p2\nauthor A <a@b> 1 +0000\ncommitter B <b@c> 1 +0000\n\nSome message.\n";
        let kv = KeyValueList::parse(data).unwrap();
        assert_eq!(kv.serialize(), data);
    }
}
