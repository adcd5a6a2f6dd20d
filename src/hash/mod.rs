//! Leaf layer: rolling checksum and cryptographic digests.
//!
//! Nothing in this module depends on anything else in the crate — it is
//! the bottom of the dependency order in spec.md §2 ("digest hashers and
//! rolling hash" come first).

pub mod adler32;
pub mod sha1;
pub mod sha256;

pub use adler32::Adler32;
pub use sha1::Sha1Digest;
pub use sha256::Sha256Digest;
