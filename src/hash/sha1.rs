//! SHA-1 digest — fingerprints chunks (20 bytes).
//!
//! Treated as a black box per spec.md §4.2: we depend on the `sha1`
//! crate's collision-resistance and determinism, and only wrap it in the
//! `start`/`update`/`finalize` shape the rest of this crate's hashers
//! (`Adler32`, [`super::sha256::Sha256Digest`]) share.

use sha1::{Digest, Sha1};

pub const DIGEST_SIZE: usize = 20;

#[derive(Default)]
pub struct Sha1Digest(Sha1);

impl Sha1Digest {
    pub fn start() -> Self {
        Sha1Digest(Sha1::new())
    }

    pub fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    pub fn finalize(self) -> [u8; DIGEST_SIZE] {
        self.0.finalize().into()
    }

    /// One-shot convenience used throughout the chunker and multichunk.
    pub fn of(data: &[u8]) -> [u8; DIGEST_SIZE] {
        let mut h = Sha1Digest::start();
        h.update(data);
        h.finalize()
    }
}
