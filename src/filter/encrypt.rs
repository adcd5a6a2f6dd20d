//! Filter ID 2: block-sorting compression followed by authenticated
//! encryption, built on the teacher's AES-256-GCM + Argon2id primitives.

use crate::error::{Error, Result};
use crate::filter::compress::CompressFilter;
use crate::filter::Filter;

/// Wraps [`CompressFilter`] and applies AES-256-GCM on top: forward is
/// compress-then-encrypt, reverse is decrypt-then-decompress, matching
/// "filters compose left-to-right on write" for this two-stage filter
/// kind.
pub struct EncryptFilter {
    compress: CompressFilter,
    key: [u8; 32],
}

impl EncryptFilter {
    pub fn new(key: [u8; 32], block_size: usize) -> Self {
        EncryptFilter {
            compress: CompressFilter::new(block_size),
            key,
        }
    }

    /// Derive the key from a password and a per-repository salt via
    /// Argon2id.
    pub fn from_password(password: &str, salt: &[u8], block_size: usize) -> Result<Self> {
        let key = crate::crypto::derive_key(password, salt).map_err(|e| Error::bad_parameter(e.to_string()))?;
        Ok(EncryptFilter::new(key, block_size))
    }
}

impl Filter for EncryptFilter {
    fn apply_forward(&self, src: &[u8]) -> Result<Vec<u8>> {
        let compressed = self.compress.apply_forward(src)?;
        crate::crypto::encrypt(&self.key, &compressed).map_err(|e| Error::bad_parameter(e.to_string()))
    }

    fn apply_reverse(&self, src: &[u8]) -> Result<Vec<u8>> {
        let compressed = crate::crypto::decrypt(&self.key, src).map_err(|e| Error::data_corrupt(e.to_string()))?;
        self.compress.apply_reverse(&compressed)
    }
}
