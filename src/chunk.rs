//! Content-defined chunking: the TTTD (two-threshold, two-divisor) cutter.
//!
//! Ported from `File::TTTDChunker` / `File::Chunk` in the original
//! implementation. A chunk boundary is a position where a rolling
//! Adler-32 checksum, taken over the trailing window, hits one of two
//! divisor residues: a high divider (preferred break) or a low divider
//! (fallback break, remembered as we scan past it in case the high
//! divider is never hit before `max_size`).

use crate::error::{Error, Result};
use crate::hash::{Adler32, Sha1Digest};

/// Fixed per Heckel's thesis, to bound chunk buffer allocation.
pub const MAX_CHUNK_SIZE: usize = 11299;
pub const HEADER_SIZE: usize = crate::hash::sha1::DIGEST_SIZE + 2;

/// One content-addressed chunk: its SHA-1 identity and its bytes.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub checksum: [u8; crate::hash::sha1::DIGEST_SIZE],
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A TTTD chunker configured with a minimum/maximum chunk size and the two
/// divisors. Stateless across calls other than these parameters — the
/// rolling hash is local to each `cut` invocation.
pub struct TttdChunker {
    min_size: usize,
    max_size: usize,
    high_divider: u32,
    low_divider: u32,
}

impl TttdChunker {
    /// Derive min/max/high/low from a single target average chunk size,
    /// using the same ratios as the original (460/2800/540/270 over 1015).
    pub fn with_average_size(avg_size: usize) -> Result<Self> {
        let avg = avg_size as f64;
        let min_size = (460.0 * avg / 1015.0 + 0.5) as usize;
        let max_size = (2800.0 * avg / 1015.0 + 0.5) as usize;
        let high_divider = (540.0 * avg / 1015.0 + 0.5) as u32;
        let low_divider = (270.0 * avg / 1015.0 + 0.5) as u32;
        Self::with_explicit_params(min_size, max_size, high_divider, low_divider)
    }

    /// Construct from explicit, already-derived parameters.
    pub fn with_explicit_params(
        min_size: usize,
        max_size: usize,
        high_divider: u32,
        low_divider: u32,
    ) -> Result<Self> {
        if max_size >= 65535 {
            return Err(Error::bad_parameter(format!(
                "max_size {max_size} must stay below 65535"
            )));
        }
        if min_size == 0 || min_size >= max_size {
            return Err(Error::bad_parameter(
                "min_size must be nonzero and less than max_size",
            ));
        }
        if high_divider == 0 || low_divider == 0 {
            return Err(Error::bad_parameter("dividers must be nonzero"));
        }
        Ok(TttdChunker {
            min_size,
            max_size,
            high_divider,
            low_divider,
        })
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Read up to `max_size` bytes from `input` and cut one chunk.
    ///
    /// Returns `Ok(None)` when the input is exhausted (no bytes read at
    /// all). On success, at most `max_size` bytes are consumed from
    /// `input` and the chunk's true byte count may be less than what was
    /// read — callers passing a non-seekable source must buffer ahead
    /// and only advance their read cursor by `chunk.size()`, mirroring
    /// the original's `setPosition(curPos + breakPos)` rewind.
    pub fn cut<R: std::io::Read>(&self, input: &mut R) -> Result<Option<Chunk>> {
        // The read-ahead window is capped at MAX_CHUNK_SIZE regardless of
        // max_size, matching the original's `min(ArrSz(chunk.data),
        // maxChunkSize)` against its fixed-size chunk buffer.
        let window = self.max_size.min(MAX_CHUNK_SIZE);
        let mut buf = vec![0u8; window];
        let read = read_up_to(input, &mut buf)?;
        if read == 0 {
            return Ok(None);
        }
        buf.truncate(read);

        if read <= self.min_size {
            let checksum = Sha1Digest::of(&buf);
            return Ok(Some(Chunk { checksum, data: buf }));
        }

        let mut rolling = Adler32::start();
        let mut backup_break: usize = 0;
        let mut break_pos: usize = 0;

        for i in self.min_size..read {
            rolling.append(buf[i]);
            let checksum = rolling.checksum_le();
            if checksum % self.low_divider == self.low_divider - 1 {
                backup_break = i + 1;
            }
            if checksum % self.high_divider == self.high_divider - 1 {
                break_pos = i + 1;
                break;
            }
        }

        if break_pos == 0 {
            break_pos = if backup_break != 0 { backup_break } else { read };
        }

        // Bytes past break_pos were only read to search for a boundary;
        // the caller (SeekRewind) rewinds the stream to the true
        // boundary using `chunk.size()`.
        buf.truncate(break_pos);
        let checksum = Sha1Digest::of(&buf);

        Ok(Some(Chunk { checksum, data: buf }))
    }
}

fn read_up_to<R: std::io::Read>(input: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match input.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

/// A `Read` adapter that lets [`TttdChunker::cut`] rewind past its own
/// read-ahead, for sources that support [`std::io::Seek`].
pub struct SeekRewind<S> {
    inner: S,
}

impl<S: std::io::Read + std::io::Seek> SeekRewind<S> {
    pub fn new(inner: S) -> Self {
        SeekRewind { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Cut a single chunk, rewinding the underlying stream to the true
    /// chunk boundary on a partial read.
    pub fn cut_chunk(&mut self, chunker: &TttdChunker) -> Result<Option<Chunk>> {
        let start = self.inner.stream_position()?;
        let chunk = chunker.cut(&mut self.inner)?;
        if let Some(ref c) = chunk {
            self.inner
                .seek(std::io::SeekFrom::Start(start + c.size() as u64))?;
        }
        Ok(chunk)
    }

    pub fn stream_position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Seek to an absolute position, used by `Multichunk::pack_next_chunk`
    /// to back out of a chunk that turned out not to fit.
    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(std::io::SeekFrom::Start(pos))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn chunker() -> TttdChunker {
        TttdChunker::with_average_size(4096).unwrap()
    }

    #[test]
    fn derives_expected_parameters_for_4096_average() {
        let c = chunker();
        assert_eq!(c.min_size(), 1856);
        assert_eq!(c.max_size(), 11299);
    }

    #[test]
    fn rejects_max_size_at_or_above_65535() {
        let err = TttdChunker::with_explicit_params(100, 65535, 50, 25);
        assert!(err.is_err());
    }

    #[test]
    fn short_input_becomes_single_chunk_at_min_size_boundary() {
        let c = TttdChunker::with_explicit_params(32, 256, 64, 32).unwrap();
        let data = vec![7u8; 10];
        let mut cursor = SeekRewind::new(Cursor::new(data.clone()));
        let chunk = cursor.cut_chunk(&c).unwrap().unwrap();
        assert_eq!(chunk.data, data);
        assert_eq!(chunk.checksum, Sha1Digest::of(&data));
    }

    #[test]
    fn chunking_is_deterministic_and_covers_whole_input() {
        let c = chunker();
        let data: Vec<u8> = (0u32..200_000).map(|i| (i % 251) as u8).collect();

        let mut cursor = SeekRewind::new(Cursor::new(data.clone()));
        let mut reassembled = Vec::new();
        let mut chunk_count = 0;
        while let Some(chunk) = cursor.cut_chunk(&c).unwrap() {
            assert!(chunk.size() <= c.max_size());
            reassembled.extend_from_slice(&chunk.data);
            chunk_count += 1;
        }
        assert_eq!(reassembled, data);
        assert!(chunk_count > 1);
    }

    #[test]
    fn identical_prefix_produces_identical_first_chunk() {
        let c = chunker();
        let shared: Vec<u8> = (0u32..50_000).map(|i| (i % 97) as u8).collect();
        let mut tail_a = shared.clone();
        tail_a.extend_from_slice(&[1, 2, 3]);
        let mut tail_b = shared.clone();
        tail_b.extend_from_slice(&[9, 9, 9, 9, 9]);

        let mut cursor_a = SeekRewind::new(Cursor::new(tail_a));
        let mut cursor_b = SeekRewind::new(Cursor::new(tail_b));
        let first_a = cursor_a.cut_chunk(&c).unwrap().unwrap();
        let first_b = cursor_b.cut_chunk(&c).unwrap().unwrap();
        assert_eq!(first_a.checksum, first_b.checksum);
        assert_eq!(first_a.data, first_b.data);
    }

    #[test]
    fn empty_input_yields_no_chunk() {
        let c = chunker();
        let mut cursor = SeekRewind::new(Cursor::new(Vec::<u8>::new()));
        assert!(cursor.cut_chunk(&c).unwrap().is_none());
    }
}
