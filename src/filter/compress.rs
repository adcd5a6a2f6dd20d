//! Filter ID 1: block-sorting compression, wrapping a one-shot call to
//! the streaming compressor session.

use std::io::Cursor;

use crate::compressor::{BzCoder, CompressSession, DecompressSession};
use crate::error::Result;
use crate::filter::Filter;

/// Whole-buffer convenience over [`CompressSession`]/[`DecompressSession`]
/// — the filter chain operates on already-packed multichunk bytes, not
/// on an open-ended stream, so there is no back-pressure to model here.
pub struct CompressFilter {
    block_size: usize,
}

impl CompressFilter {
    pub fn new(block_size: usize) -> Self {
        CompressFilter { block_size }
    }
}

impl Default for CompressFilter {
    fn default() -> Self {
        CompressFilter::new(crate::compressor::DEFAULT_BLOCK_SIZE)
    }
}

impl Filter for CompressFilter {
    fn apply_forward(&self, src: &[u8]) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        let mut session =
            CompressSession::new_known_size(&mut out, Box::new(BzCoder::new()), self.block_size, src.len() as u64);
        let mut input = Cursor::new(src.to_vec());
        loop {
            let n = session.compress_stream(&mut input, 0, true)?;
            if n == 0 {
                break;
            }
        }
        session.finish()?;
        Ok(out.into_inner())
    }

    fn apply_reverse(&self, src: &[u8]) -> Result<Vec<u8>> {
        let mut session = DecompressSession::new(Cursor::new(src.to_vec()), Box::new(BzCoder::new()));
        let mut out = Vec::new();
        session.decompress_stream(&mut out, 0)?;
        Ok(out)
    }
}
