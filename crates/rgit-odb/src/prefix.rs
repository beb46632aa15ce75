//! OID prefix resolution (short hex -> full OID with ambiguity detection).

use rgit_hash::{ObjectId, OID_HEX_LEN};
use rgit_loose::LooseObjectStore;

use crate::OdbError;

/// Minimum prefix length (matches C git's MINIMUM_ABBREV).
pub const MINIMUM_ABBREV: usize = 4;

/// Outcome of resolving a hex prefix against the loose object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixResolution {
    Found(ObjectId),
    NotFound,
    Ambiguous(Vec<ObjectId>),
}

/// Resolve a hex prefix to a full OID, per spec §4.5 rule 3.
///
/// Prefixes shorter than `MINIMUM_ABBREV` are rejected outright, matching
/// C git's refusal to disambiguate very short abbreviations.
pub fn resolve_prefix(
    loose: &LooseObjectStore,
    prefix: &str,
) -> Result<PrefixResolution, OdbError> {
    if prefix.len() < MINIMUM_ABBREV || !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Ok(PrefixResolution::NotFound);
    }

    if prefix.len() == OID_HEX_LEN {
        return match ObjectId::from_hex(prefix) {
            Ok(oid) if loose.contains(&oid) => Ok(PrefixResolution::Found(oid)),
            _ => Ok(PrefixResolution::NotFound),
        };
    }

    let mut matches: Vec<ObjectId> = Vec::new();
    for result in loose.iter()? {
        let oid = result?;
        if oid.starts_with_hex(prefix) {
            matches.push(oid);
        }
    }

    match matches.len() {
        0 => Ok(PrefixResolution::NotFound),
        1 => Ok(PrefixResolution::Found(matches[0])),
        _ => {
            matches.sort();
            Ok(PrefixResolution::Ambiguous(matches))
        }
    }
}
