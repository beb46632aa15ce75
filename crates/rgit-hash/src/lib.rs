//! Object identity for rgit: a single SHA-1-based `ObjectId`, hex codec, and
//! streaming hasher. Multi-algorithm hashing is out of scope.

mod error;
pub mod hasher;
pub mod hex;
mod oid;

pub use error::HashError;
pub use hasher::Hasher;
pub use oid::{ObjectId, OID_HEX_LEN, OID_LEN};
