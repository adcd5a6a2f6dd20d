//! Streaming block-sorting compressor: write-path and read-path session
//! state machines wrapping a [`Coder`].
//!
//! The sink type is bound to `Write + Seek` rather than checked at
//! runtime: the original's "non-seekable sinks must fail at the first
//! byte they cannot recover" becomes, in Rust, a type that simply cannot
//! be constructed without seek support. There is no runtime branch for
//! it.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{Error, Result};
use crate::membuf::MemoryBuffer;

use super::block_header::{BlockHeader, Mode};
use super::coder::Coder;

/// `blockSize = (round(f * 9) * 99 + 1) MiB`; `f` is a compression factor
/// in `[0.0, 1.0]`. Unconfigured sessions default to 25 MiB.
pub const DEFAULT_BLOCK_SIZE: usize = 25 * 1024 * 1024;

pub fn block_size_for_factor(f: f64) -> Result<usize> {
    if !(0.0..=1.0).contains(&f) {
        return Err(Error::bad_parameter(format!("compression factor {f} out of [0.0, 1.0]")));
    }
    let mib = (f * 9.0).round() * 99.0 + 1.0;
    Ok(mib as usize * 1024 * 1024)
}

const PRE_HEADER_SIZE: usize = 10;

/// Fixed by this core: spec §4.5 pins both fields.
const RECORD_SIZE: i8 = 1;
const SORTING_CONTEXT: i8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteState {
    Fresh,
    HeaderReserved,
    Finalized,
}

/// Write-path session: `Fresh -> HeaderReserved -> BlockEmitting* -> Finalized`.
/// `BlockEmitting` is not a distinct enum state here — it is simply the
/// condition "HeaderReserved and buffer holds at least one full block" —
/// since nothing else distinguishes it structurally.
pub struct CompressSession<W: Write + Seek> {
    coder: Box<dyn Coder>,
    output: W,
    block_size: usize,
    buffer: MemoryBuffer,
    state: WriteState,
    /// Position in `output` where the 4-byte block count was written;
    /// patched at finalize.
    count_position: u64,
    /// Initialized to `-N` for known-size sessions, `0` for unknown-size.
    /// Used only to size the header's expected-count estimate.
    session_counter: i64,
    /// True count of blocks actually emitted, written back at finalize.
    blocks_emitted: u32,
    source_offset: u64,
}

impl<W: Write + Seek> CompressSession<W> {
    /// Known-size entry point: `total_size` is the caller's declared
    /// total input length.
    pub fn new_known_size(output: W, coder: Box<dyn Coder>, block_size: usize, total_size: u64) -> Self {
        CompressSession {
            coder,
            output,
            block_size,
            buffer: MemoryBuffer::new(block_size),
            state: WriteState::Fresh,
            count_position: 0,
            session_counter: -(total_size as i64),
            blocks_emitted: 0,
            source_offset: 0,
        }
    }

    /// Unknown-size entry point: the block count is purely an estimate
    /// until finalize patches it.
    pub fn new_unknown_size(output: W, coder: Box<dyn Coder>, block_size: usize) -> Self {
        CompressSession {
            coder,
            output,
            block_size,
            buffer: MemoryBuffer::new(block_size),
            state: WriteState::Fresh,
            count_position: 0,
            session_counter: 0,
            blocks_emitted: 0,
            source_offset: 0,
        }
    }

    fn ensure_header_reserved(&mut self) -> Result<()> {
        if self.state != WriteState::Fresh {
            return Ok(());
        }
        self.count_position = self.output.stream_position()?;
        let expected = if self.session_counter < 0 {
            let total = (-self.session_counter) as u64;
            total.div_ceil(self.block_size as u64) as u32
        } else {
            0
        };
        self.output.write_all(&expected.to_le_bytes())?;
        self.state = WriteState::HeaderReserved;
        log::debug!("compress session header reserved at {}, expected {expected} blocks", self.count_position);
        Ok(())
    }

    /// `compressStream(output, input, maxToProcess, lastCall)`. Returns
    /// the number of source bytes actually consumed from `input` this
    /// call. `maxToProcess = 0` means drain until `input` is exhausted.
    pub fn compress_stream<R: Read>(&mut self, input: &mut R, max_to_process: usize, last_call: bool) -> Result<usize> {
        if self.state == WriteState::Finalized {
            return Err(Error::bad_parameter("compress_stream called after finalize"));
        }
        self.ensure_header_reserved()?;

        let wanted = if max_to_process == 0 {
            self.buffer.total()
        } else {
            max_to_process
        };

        // Back-pressure: if the buffer can absorb everything requested
        // and we are not being asked to flush, just fill and return.
        if !last_call && self.buffer.can_fit(wanted) {
            return Ok(self.buffer.refill(input, wanted)?);
        }

        let read = self.buffer.refill(input, wanted)?;

        loop {
            let available = self.buffer.available();
            if available >= self.block_size {
                self.emit_block(self.block_size)?;
                continue;
            }
            if last_call && available > 0 {
                self.emit_block(available)?;
                continue;
            }
            break;
        }

        if read == 0 && self.buffer.available() == 0 {
            self.finalize()?;
        }

        Ok(read)
    }

    fn emit_block(&mut self, take: usize) -> Result<()> {
        let src = self.buffer.as_slice()[..take].to_vec();

        let compressed = match self.coder.compress_block(&src)? {
            Some(block) => block,
            None => {
                log::debug!("block at source offset {} not compressible, storing raw ({} bytes)", self.source_offset, src.len());
                self.coder.store_block(&src)
            }
        };

        let pre_header = build_pre_header(self.source_offset);
        let src_adler = super::coder::adler32_of(&src);
        let comp_adler = super::coder::adler32_of(&compressed.body);
        let header = BlockHeader {
            block_size: (super::block_header::BLOCK_HEADER_SIZE + compressed.body.len()) as u32,
            data_size: take as u32,
            mode: compressed.mode,
            primary_index: compressed.primary_index,
            src_adler,
            comp_adler,
        };

        self.output.write_all(&pre_header)?;
        self.output.write_all(&header.write())?;
        self.output.write_all(&compressed.body)?;

        self.buffer.use_bytes(take);
        self.source_offset += take as u64;
        self.blocks_emitted += 1;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        if self.buffer.available() > 0 {
            let remaining = self.buffer.available();
            self.emit_block(remaining)?;
        }
        let end = self.output.stream_position()?;
        self.output.seek(SeekFrom::Start(self.count_position))?;
        self.output.write_all(&self.blocks_emitted.to_le_bytes())?;
        self.output.seek(SeekFrom::Start(end))?;

        self.state = WriteState::Finalized;
        self.session_counter = 0;
        log::debug!("compress session finalized, {} blocks emitted", self.blocks_emitted);
        Ok(())
    }

    /// Explicit flush for callers that know they are at the end of input
    /// but whose last `compress_stream` call returned a nonzero read
    /// (e.g. the final chunk landed exactly on a buffer boundary).
    pub fn finish(&mut self) -> Result<()> {
        if self.state != WriteState::Finalized {
            self.finalize()?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

/// `read_exact`, but a stream that runs dry mid-read reports `on_eof`
/// (`UnexpectedEob`/`UnexpectedEod` per spec §4.5/§7) instead of a bare
/// `io::Error` — truncation inside a header or a body are protocol-level
/// failures, not opaque I/O ones.
fn read_exact_or<R: Read>(input: &mut R, buf: &mut [u8], on_eof: Error) -> Result<()> {
    match input.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(on_eof),
        Err(e) => Err(e.into()),
    }
}

fn build_pre_header(source_offset: u64) -> [u8; PRE_HEADER_SIZE] {
    let mut buf = [0u8; PRE_HEADER_SIZE];
    buf[0..8].copy_from_slice(&(source_offset as i64).to_le_bytes());
    buf[8] = RECORD_SIZE as u8;
    buf[9] = SORTING_CONTEXT as u8;
    buf
}

struct PreHeader {
    #[allow(dead_code)]
    source_offset: i64,
    record_size: i8,
    sorting_context: i8,
}

fn parse_pre_header(buf: &[u8; PRE_HEADER_SIZE]) -> Result<PreHeader> {
    let source_offset = i64::from_le_bytes(buf[0..8].try_into().unwrap());
    let record_size = buf[8] as i8;
    let sorting_context = buf[9] as i8;
    if record_size < 1 {
        return Err(Error::data_corrupt(format!("invalid recordSize {record_size}")));
    }
    if sorting_context != 1 && sorting_context != 2 {
        return Err(Error::data_corrupt(format!("invalid sortingContext {sorting_context}")));
    }
    Ok(PreHeader {
        source_offset,
        record_size,
        sorting_context,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Fresh,
    Reading,
    Done,
}

/// Read-path session: `Fresh -> CountRead -> (HeaderRead -> BodyRead ->
/// BlockDecode -> Deliver)* -> Fresh`. The per-block sub-states are
/// folded into `decode_next_block`, which runs them back-to-back since
/// nothing here suspends mid-block — only between calls to
/// `decompress_stream`.
pub struct DecompressSession<R: Read> {
    coder: Box<dyn Coder>,
    input: R,
    state: ReadState,
    remaining_blocks: u32,
    /// Decoded bytes not yet delivered to the caller's output sink.
    pending: Vec<u8>,
    pending_offset: usize,
}

impl<R: Read> DecompressSession<R> {
    pub fn new(input: R, coder: Box<dyn Coder>) -> Self {
        DecompressSession {
            coder,
            input,
            state: ReadState::Fresh,
            remaining_blocks: 0,
            pending: Vec::new(),
            pending_offset: 0,
        }
    }

    fn ensure_started(&mut self) -> Result<()> {
        if self.state != ReadState::Fresh {
            return Ok(());
        }
        let mut count_bytes = [0u8; 4];
        read_exact_or(&mut self.input, &mut count_bytes, Error::UnexpectedEob)?;
        self.remaining_blocks = u32::from_le_bytes(count_bytes);
        self.state = ReadState::Reading;
        Ok(())
    }

    fn decode_next_block(&mut self) -> Result<()> {
        let mut pre_header_bytes = [0u8; PRE_HEADER_SIZE];
        read_exact_or(&mut self.input, &mut pre_header_bytes, Error::UnexpectedEob)?;
        let pre_header = parse_pre_header(&pre_header_bytes)?;

        let mut header_bytes = [0u8; super::block_header::BLOCK_HEADER_SIZE];
        read_exact_or(&mut self.input, &mut header_bytes, Error::UnexpectedEob)?;
        let header = BlockHeader::inspect(&header_bytes)?;

        let body_len = header.block_size as usize - super::block_header::BLOCK_HEADER_SIZE;
        let mut body = vec![0u8; body_len];
        read_exact_or(&mut self.input, &mut body, Error::UnexpectedEod)?;

        if super::coder::adler32_of(&body) != header.comp_adler {
            return Err(Error::data_corrupt("compAdler mismatch: block body corrupted"));
        }

        let mut decoded = if header.mode.is_stored() {
            body
        } else {
            self.coder.decompress_block(&body, header.mode, header.data_size)?
        };

        if super::coder::adler32_of(&decoded) != header.src_adler {
            return Err(Error::data_corrupt("srcAdler mismatch: decoded bytes corrupted"));
        }

        self.coder
            .post_process(&mut decoded, pre_header.sorting_context as u8, pre_header.record_size as u8);

        self.pending = decoded;
        self.pending_offset = 0;
        self.remaining_blocks -= 1;
        Ok(())
    }

    /// `decompressStream(output, maxToProcess)`. Returns bytes delivered.
    /// `max_to_process = 0` drains every remaining block.
    pub fn decompress_stream<W: Write>(&mut self, output: &mut W, max_to_process: usize) -> Result<usize> {
        self.ensure_started()?;

        let mut delivered = 0usize;
        loop {
            if self.pending_offset < self.pending.len() {
                let available = self.pending.len() - self.pending_offset;
                let take = if max_to_process == 0 {
                    available
                } else {
                    available.min(max_to_process - delivered)
                };
                output.write_all(&self.pending[self.pending_offset..self.pending_offset + take])?;
                self.pending_offset += take;
                delivered += take;
                if max_to_process != 0 && delivered >= max_to_process {
                    break;
                }
                continue;
            }

            if self.remaining_blocks == 0 {
                self.state = ReadState::Done;
                break;
            }
            self.decode_next_block()?;
        }

        if self.remaining_blocks == 0 && self.pending_offset >= self.pending.len() {
            self.state = ReadState::Fresh;
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::coder::BzCoder;
    use std::io::Cursor;

    fn round_trip(data: &[u8], block_size: usize) -> Vec<u8> {
        let mut compressed = Cursor::new(Vec::new());
        {
            let mut session =
                CompressSession::new_known_size(&mut compressed, Box::new(BzCoder::new()), block_size, data.len() as u64);
            let mut src = Cursor::new(data.to_vec());
            loop {
                let n = session.compress_stream(&mut src, 0, true).unwrap();
                if n == 0 {
                    break;
                }
            }
            session.finish().unwrap();
        }

        compressed.set_position(0);
        let mut session = DecompressSession::new(compressed, Box::new(BzCoder::new()));
        let mut out = Vec::new();
        session.decompress_stream(&mut out, 0).unwrap();
        out
    }

    #[test]
    fn round_trips_small_input_single_block() {
        let data = vec![b'x'; 1000];
        assert_eq!(round_trip(&data, 4096), data);
    }

    #[test]
    fn round_trips_multi_block_input() {
        let data: Vec<u8> = (0u32..50_000).map(|i| (i % 200) as u8).collect();
        assert_eq!(round_trip(&data, 4096), data);
    }

    #[test]
    fn round_trips_empty_input() {
        let data: Vec<u8> = Vec::new();
        assert_eq!(round_trip(&data, 4096), data);
    }

    #[test]
    fn block_size_for_factor_matches_default_at_zero() {
        // f=0 -> round(0)*99+1 = 1 MiB, not the unconfigured default;
        // the 25 MiB default only applies when the caller supplies no
        // factor at all.
        assert_eq!(block_size_for_factor(0.0).unwrap(), 1 * 1024 * 1024);
        assert_eq!(block_size_for_factor(1.0).unwrap(), (9 * 99 + 1) * 1024 * 1024);
    }

    #[test]
    fn block_size_for_factor_rejects_out_of_range() {
        assert!(block_size_for_factor(1.5).is_err());
        assert!(block_size_for_factor(-0.1).is_err());
    }

    fn compress(data: &[u8], block_size: usize) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        let mut session = CompressSession::new_known_size(&mut out, Box::new(BzCoder::new()), block_size, data.len() as u64);
        let mut input = Cursor::new(data.to_vec());
        loop {
            if session.compress_stream(&mut input, 0, true).unwrap() == 0 {
                break;
            }
        }
        session.finish().unwrap();
        out.into_inner()
    }

    /// A stream truncated inside a block header fails with `UnexpectedEob`
    /// rather than an opaque I/O error (spec §4.5/§7).
    #[test]
    fn truncation_inside_header_reports_unexpected_eob() {
        let framed = compress(&vec![b'q'; 5000], 4096);
        // count(4) + pre-header(10) + 20 of the 28 header bytes: cuts
        // squarely inside the block header, before any body byte.
        let cut = 4 + PRE_HEADER_SIZE + 20;
        let truncated = &framed[..cut];
        let mut session = DecompressSession::new(Cursor::new(truncated.to_vec()), Box::new(BzCoder::new()));
        let mut out = Vec::new();
        let err = session.decompress_stream(&mut out, 0).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEob));
    }

    /// A stream truncated inside a block body fails with `UnexpectedEod`.
    #[test]
    fn truncation_inside_body_reports_unexpected_eod() {
        let framed = compress(&(0u32..20_000).map(|i| (i % 211) as u8).collect::<Vec<u8>>(), 4096);
        // Cut well past every header but short of the final body's end.
        let truncated = &framed[..framed.len() - 2];
        let mut session = DecompressSession::new(Cursor::new(truncated.to_vec()), Box::new(BzCoder::new()));
        let mut out = Vec::new();
        let err = session.decompress_stream(&mut out, 0).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEod));
    }

    /// A flipped body byte leaves the (unrelated) header Adler-32 intact
    /// but must still be caught via the body's own `compAdler` — a stored
    /// block makes this unambiguous since `body == src`.
    #[test]
    fn flipped_body_byte_is_detected_via_comp_adler() {
        use super::super::coder::AlwaysStoreCoder;

        let data = vec![b'm'; 5000];
        let mut framed = Cursor::new(Vec::new());
        {
            let mut session =
                CompressSession::new_known_size(&mut framed, Box::new(AlwaysStoreCoder), 4096, data.len() as u64);
            let mut input = Cursor::new(data);
            loop {
                if session.compress_stream(&mut input, 0, true).unwrap() == 0 {
                    break;
                }
            }
            session.finish().unwrap();
        }
        let mut bytes = framed.into_inner();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        let mut session = DecompressSession::new(Cursor::new(bytes), Box::new(AlwaysStoreCoder));
        let mut out = Vec::new();
        let err = session.decompress_stream(&mut out, 0).unwrap_err();
        assert!(matches!(err, Error::DataCorrupt(_)));
    }
}
