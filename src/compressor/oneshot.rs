//! Dry-run sizing: the one-shot `compressData`/`decompressData` contract
//! from spec.md §4.5.
//!
//! Both accept an output buffer that may be absent. When absent, the
//! session runs to completion against a [`NullSink`] that only counts
//! bytes, never stores them; the caller reads off the reported size,
//! allocates a buffer of exactly that length, and calls again with a real
//! buffer. This is what makes the two-phase "size, then allocate, then
//! fill" pattern safe without ever rewinding input twice: both passes
//! read `data` from the start and write `data.len()`-identical output,
//! since the session's behavior depends only on input bytes and
//! configuration, never on the sink.

use std::io::{Cursor, Seek, SeekFrom, Write};

use crate::error::Result;

use super::{CompressSession, Coder, DecompressSession};

/// A `Write + Seek` sink that discards every byte and only tracks how
/// many were written — the high-water mark of `position`, so that a
/// finalize-time seek-back-and-patch (§4.5 `HeaderReserved`) does not
/// undercount the true length.
#[derive(Default)]
pub struct NullSink {
    position: u64,
    high_water: u64,
}

impl NullSink {
    pub fn new() -> Self {
        NullSink::default()
    }

    pub fn len(&self) -> u64 {
        self.high_water
    }

    pub fn is_empty(&self) -> bool {
        self.high_water == 0
    }
}

impl Write for NullSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.position += buf.len() as u64;
        self.high_water = self.high_water.max(self.position);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Seek for NullSink {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.position = match pos {
            SeekFrom::Start(p) => p,
            SeekFrom::End(p) => (self.high_water as i64 + p).max(0) as u64,
            SeekFrom::Current(p) => (self.position as i64 + p).max(0) as u64,
        };
        Ok(self.position)
    }
}

/// One-shot compress. `output = None` runs a dry-run sizing pass and
/// returns only the byte count that would have been written. `output =
/// Some(buf)` writes the real framed stream into `buf`, which must be
/// exactly the size reported by the prior dry run (a too-small buffer
/// fails with [`crate::error::Error::Io`]; a too-large one is simply not
/// fully used — callers following the documented protocol pass the exact
/// size).
pub fn compress_data(data: &[u8], coder: Box<dyn Coder>, block_size: usize, output: Option<&mut [u8]>) -> Result<usize> {
    match output {
        None => {
            let mut sink = NullSink::new();
            run_compress(&mut sink, data, coder, block_size)?;
            Ok(sink.len() as usize)
        }
        Some(buf) => {
            let mut sink = Cursor::new(buf);
            run_compress(&mut sink, data, coder, block_size)?;
            Ok(sink.position() as usize)
        }
    }
}

fn run_compress<W: Write + Seek>(sink: &mut W, data: &[u8], coder: Box<dyn Coder>, block_size: usize) -> Result<()> {
    let mut session = CompressSession::new_known_size(sink, coder, block_size, data.len() as u64);
    let mut input = Cursor::new(data);
    loop {
        let n = session.compress_stream(&mut input, 0, true)?;
        if n == 0 {
            break;
        }
    }
    session.finish()
}

/// One-shot decompress, same dry-run convention as [`compress_data`]:
/// `output = None` counts bytes only, `output = Some(buf)` must be
/// exactly that many bytes.
pub fn decompress_data(data: &[u8], coder: Box<dyn Coder>, output: Option<&mut [u8]>) -> Result<usize> {
    match output {
        None => {
            let mut sink = NullSink::new();
            run_decompress(&mut sink, data, coder)?;
            Ok(sink.len() as usize)
        }
        Some(buf) => {
            let mut sink = Cursor::new(buf);
            run_decompress(&mut sink, data, coder)?;
            Ok(sink.position() as usize)
        }
    }
}

fn run_decompress<W: Write>(sink: &mut W, data: &[u8], coder: Box<dyn Coder>) -> Result<()> {
    // `max_to_process = 0` drains every remaining block in a single call.
    let mut session = DecompressSession::new(Cursor::new(data), coder);
    session.decompress_stream(sink, 0)?;
    Ok(())
}
