//! SHA-256 digest — fingerprints multichunks (32 bytes).
//!
//! Same black-box treatment as [`super::sha1::Sha1Digest`], backed by the
//! `sha2` crate.

use sha2::{Digest, Sha256};

pub const DIGEST_SIZE: usize = 32;

#[derive(Default)]
pub struct Sha256Digest(Sha256);

impl Sha256Digest {
    pub fn start() -> Self {
        Sha256Digest(Sha256::new())
    }

    pub fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    pub fn finalize(self) -> [u8; DIGEST_SIZE] {
        self.0.finalize().into()
    }

    pub fn of(data: &[u8]) -> [u8; DIGEST_SIZE] {
        let mut h = Sha256Digest::start();
        h.update(data);
        h.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremental_matches_one_shot() {
        let data = b"multichunk identity bytes";
        let one_shot = Sha256Digest::of(data);

        let mut incremental = Sha256Digest::start();
        incremental.update(&data[..5]);
        incremental.update(&data[5..]);
        assert_eq!(incremental.finalize(), one_shot);
    }
}
