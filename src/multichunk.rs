//! Multichunk container: packs chunks end-to-end plus a sorted offset
//! index, up to a process-wide size budget.
//!
//! Grounded on `File::MultiChunk` in the original implementation, adapted
//! to a packed `chunkAndFilter` header word instead of the original's
//! plain `{count, filterListID}` pair.

use std::io::{Read, Seek, Write};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::chunk::{Chunk, SeekRewind, TttdChunker, HEADER_SIZE};
use crate::error::Result;
use crate::hash::{sha1, Sha256Digest};

/// Heckel's thesis default: a good tradeoff between per-multichunk
/// transfer overhead and per-chunk retrieval waste.
const DEFAULT_MAX_SIZE: u32 = 250 * 1024;

static MAX_MULTICHUNK_SIZE: AtomicU32 = AtomicU32::new(DEFAULT_MAX_SIZE);

/// Set the process-wide multichunk size budget. Set once at
/// initialization; every session reads it without further
/// synchronization beyond the atomic load.
pub fn set_max_multichunk_size(size: u32) {
    MAX_MULTICHUNK_SIZE.store(size, Ordering::Relaxed);
}

pub fn max_multichunk_size() -> u32 {
    MAX_MULTICHUNK_SIZE.load(Ordering::Relaxed)
}

/// A packed region of `{sha1, size, payload}` records plus a sorted index
/// of record-start offsets. Owns its data; chunks are referenced by index
/// or by digest, never copied out except on request.
pub struct Multichunk {
    data: Vec<u8>,
    /// Offsets (into `data`) of each record's leading `sha1` byte. Sorted
    /// ascending because insertion order is also offset order.
    index: Vec<u32>,
    filter_list_id: u16,
    opaque: u64,
}

impl Multichunk {
    pub fn new() -> Self {
        Multichunk {
            data: Vec::new(),
            index: Vec::new(),
            filter_list_id: 0,
            opaque: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn packed_size(&self) -> usize {
        self.data.len()
    }

    pub fn free_space(&self) -> usize {
        (max_multichunk_size() as usize).saturating_sub(self.data.len())
    }

    pub fn can_fit(&self, chunk_size: usize) -> bool {
        self.free_space() >= chunk_size + HEADER_SIZE
    }

    pub fn filter_list_id(&self) -> u16 {
        self.filter_list_id
    }

    pub fn set_filter_list_id(&mut self, id: u16) {
        self.filter_list_id = id;
    }

    pub fn opaque(&self) -> u64 {
        self.opaque
    }

    pub fn set_opaque(&mut self, value: u64) {
        self.opaque = value;
    }

    /// Bump the data region by `size + 22`, record the new offset in the
    /// sorted index, write the digest/size prefix, and return a writable
    /// view over the payload bytes. `None` if it would not fit.
    pub fn reserve_chunk_slot(&mut self, size: usize, checksum: &[u8; sha1::DIGEST_SIZE]) -> Option<&mut [u8]> {
        if !self.can_fit(size) {
            log::debug!("multichunk full: {size}-byte chunk needs {} but only {} free", size + HEADER_SIZE, self.free_space());
            return None;
        }
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(checksum);
        self.data.extend_from_slice(&(size as u16).to_le_bytes());
        let payload_start = self.data.len();
        self.data.resize(payload_start + size, 0);
        self.index.push(offset);
        Some(&mut self.data[payload_start..payload_start + size])
    }

    /// Cut one chunk from `input` via `chunker` and pack it. If the
    /// resulting chunk does not fit, the input stream is rewound to its
    /// pre-call position and `Ok(None)` is returned — the caller should
    /// flush this multichunk and start a fresh one.
    pub fn pack_next_chunk<S: Read + Seek>(
        &mut self,
        input: &mut SeekRewind<S>,
        chunker: &TttdChunker,
    ) -> Result<Option<Chunk>> {
        let start = input.stream_position()?;
        let chunk = match input.cut_chunk(chunker)? {
            Some(c) => c,
            None => return Ok(None),
        };
        match self.reserve_chunk_slot(chunk.size(), &chunk.checksum) {
            Some(slot) => {
                slot.copy_from_slice(&chunk.data);
                Ok(Some(chunk))
            }
            None => {
                input.seek_to(start)?;
                Ok(None)
            }
        }
    }

    /// Constant-time lookup by index.
    pub fn chunk(&self, i: usize) -> Option<Chunk> {
        let offset = *self.index.get(i)? as usize;
        Some(self.decode_record_at(offset))
    }

    /// The byte offset of record `i`'s leading `sha1` byte within `data`
    /// — the value callers should hold on to as `find_chunk`'s
    /// `hint_offset` (e.g. the repository layer's `likely_offset`).
    pub fn offset_of(&self, i: usize) -> Option<u32> {
        self.index.get(i).copied()
    }

    fn decode_record_at(&self, offset: usize) -> Chunk {
        let mut checksum = [0u8; sha1::DIGEST_SIZE];
        checksum.copy_from_slice(&self.data[offset..offset + sha1::DIGEST_SIZE]);
        let size_off = offset + sha1::DIGEST_SIZE;
        let size = u16::from_le_bytes([self.data[size_off], self.data[size_off + 1]]) as usize;
        let payload_start = size_off + 2;
        let data = self.data[payload_start..payload_start + size].to_vec();
        Chunk { checksum, data }
    }

    fn digest_at(&self, offset: usize) -> &[u8] {
        &self.data[offset..offset + sha1::DIGEST_SIZE]
    }

    /// `hint_offset`, if given, is the record-start offset to check first
    /// (O(log N) via binary search since the index is sorted). On a miss,
    /// or with no hint, falls back to an O(N) linear scan.
    pub fn find_chunk(&self, checksum: &[u8; sha1::DIGEST_SIZE], hint_offset: Option<u32>) -> Option<Chunk> {
        if let Some(offset) = hint_offset {
            if self.index.binary_search(&offset).is_ok() && self.digest_at(offset as usize) == checksum {
                return Some(self.decode_record_at(offset as usize));
            }
        }
        for &offset in &self.index {
            if self.digest_at(offset as usize) == checksum {
                return Some(self.decode_record_at(offset as usize));
            }
        }
        None
    }

    /// Shannon entropy of the packed bytes, normalized to `[0, 1)`.
    pub fn entropy(&self) -> f64 {
        compute_entropy(&self.data) / 8.0
    }

    /// SHA-256 over the complete packed data region.
    pub fn checksum(&self) -> [u8; 32] {
        Sha256Digest::of(&self.data)
    }

    pub fn reset(&mut self) {
        self.data.clear();
        self.index.clear();
        self.filter_list_id = 0;
        self.opaque = 0;
    }

    /// Emit `chunkAndFilter = filterListID | (N << 16)` (with the
    /// overflow `u32 N` field when `N >= 0xFFFF`), followed by the
    /// `{sha1, size}` index.
    pub fn write_header_to<W: Write>(&self, sink: &mut W) -> Result<()> {
        let n = self.index.len();
        let packed_n: u32 = if n >= 0xFFFF { 0xFFFF } else { n as u32 };
        let chunk_and_filter = (self.filter_list_id as u32) | (packed_n << 16);
        sink.write_all(&chunk_and_filter.to_le_bytes())?;
        if packed_n == 0xFFFF {
            sink.write_all(&(n as u32).to_le_bytes())?;
        }
        for &offset in &self.index {
            let offset = offset as usize;
            sink.write_all(self.digest_at(offset))?;
            let size_off = offset + sha1::DIGEST_SIZE;
            sink.write_all(&self.data[size_off..size_off + 2])?;
        }
        Ok(())
    }

    /// No transform is applied: the filter chain wraps the sink.
    pub fn write_data_to<W: Write>(&self, sink: &mut W) -> Result<()> {
        sink.write_all(&self.data)?;
        Ok(())
    }

    /// Parse the header and allocate empty, correctly-sized slots so that
    /// [`Multichunk::load_data_from`] can copy the data region directly.
    pub fn load_header_from<R: Read>(src: &mut R) -> Result<Self> {
        let mut word = [0u8; 4];
        src.read_exact(&mut word)?;
        let chunk_and_filter = u32::from_le_bytes(word);
        let filter_list_id = (chunk_and_filter & 0xFFFF) as u16;
        let mut n = chunk_and_filter >> 16;
        if n == 0xFFFF {
            let mut full = [0u8; 4];
            src.read_exact(&mut full)?;
            n = u32::from_le_bytes(full);
        }

        let mut mc = Multichunk::new();
        mc.filter_list_id = filter_list_id;
        for _ in 0..n {
            let mut record = [0u8; HEADER_SIZE];
            src.read_exact(&mut record)?;
            let size = u16::from_le_bytes([record[sha1::DIGEST_SIZE], record[sha1::DIGEST_SIZE + 1]]) as usize;
            let offset = mc.data.len() as u32;
            mc.data.extend_from_slice(&record);
            mc.data.resize(mc.data.len() + size, 0);
            mc.index.push(offset);
        }
        Ok(mc)
    }

    /// Read the complete packed region directly into `data`, overwriting
    /// the placeholder payload bytes `load_header_from` allocated.
    pub fn load_data_from<R: Read>(&mut self, src: &mut R) -> Result<()> {
        src.read_exact(&mut self.data)?;
        Ok(())
    }
}

impl Default for Multichunk {
    fn default() -> Self {
        Multichunk::new()
    }
}

fn compute_entropy(buf: &[u8]) -> f64 {
    if buf.is_empty() {
        return 0.0;
    }
    let mut counts = [0u64; 256];
    for &b in buf {
        counts[b as usize] += 1;
    }
    let len = buf.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / len;
            -p * p.log2()
        })
        .sum()
}
