//! Block header — 28 bytes, all fields little-endian `u32`.
//!
//! ```text
//! off 0  blockSize      total bytes of header+body
//! off 4  dataSize       decompressed size
//! off 8  mode           packed; see Mode
//! off12  primaryIndex
//! off16  srcAdler       Adler-32 over source bytes
//! off20  compAdler      Adler-32 over compressed body
//! off24  headerAdler    Adler-32 over bytes [0..24)
//! ```

use crate::error::Error;
use crate::hash::Adler32;

pub const BLOCK_HEADER_SIZE: usize = 28;

/// Block sorter ID, low 5 bits of `mode`. Only `Bwt` is ever produced by
/// this core; the others are recognized on read for format compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sorter {
    Bwt = 1,
}

/// Coder ID, bits 5..8 of `mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coder {
    QlfcStatic = 1,
    QlfcAdaptive = 2,
}

/// Packed compression mode: sorter (5 bits) | coder (3 bits) | lzpMinLen (8
/// bits) | lzpHashSize (8 bits). `mode == 0` means "stored, no transform"
/// (the `NotCompressible` fallback).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub sorter: Option<Sorter>,
    pub coder: Option<Coder>,
    pub lzp_min_len: u8,
    pub lzp_hash_size: u8,
}

impl Mode {
    /// `mode = 0`: the block is stored verbatim, no sorter or coder ran.
    pub const STORED: Mode = Mode {
        sorter: None,
        coder: None,
        lzp_min_len: 0,
        lzp_hash_size: 0,
    };

    pub fn compressed(coder: Coder) -> Mode {
        Mode {
            sorter: Some(Sorter::Bwt),
            coder: Some(coder),
            lzp_min_len: 0,
            lzp_hash_size: 0,
        }
    }

    pub fn is_stored(&self) -> bool {
        self.sorter.is_none()
    }

    fn encode(self) -> u32 {
        let sorter_bits = match self.sorter {
            None => 0u32,
            Some(Sorter::Bwt) => 1,
        };
        let coder_bits = match self.coder {
            None => 0u32,
            Some(Coder::QlfcStatic) => 1,
            Some(Coder::QlfcAdaptive) => 2,
        };
        (sorter_bits & 0x1F) | ((coder_bits & 0x7) << 5) | ((self.lzp_min_len as u32) << 8) | ((self.lzp_hash_size as u32) << 16)
    }

    fn decode(raw: u32) -> Result<Mode, Error> {
        let sorter_bits = raw & 0x1F;
        let coder_bits = (raw >> 5) & 0x7;
        let lzp_min_len = ((raw >> 8) & 0xFF) as u8;
        let lzp_hash_size = ((raw >> 16) & 0xFF) as u8;

        let sorter = match sorter_bits {
            0 => None,
            1 => Some(Sorter::Bwt),
            other => return Err(Error::data_corrupt(format!("unknown block sorter id {other}"))),
        };
        let coder = match coder_bits {
            0 => None,
            1 => Some(Coder::QlfcStatic),
            2 => Some(Coder::QlfcAdaptive),
            other => return Err(Error::data_corrupt(format!("unknown coder id {other}"))),
        };
        if sorter.is_none() != coder.is_none() {
            return Err(Error::data_corrupt("sorter/coder presence mismatch in mode word"));
        }
        if lzp_min_len != 0 && lzp_min_len < 4 {
            return Err(Error::data_corrupt(format!("invalid lzpMinLen {lzp_min_len}")));
        }
        if lzp_hash_size != 0 && !(10..=28).contains(&lzp_hash_size) {
            return Err(Error::data_corrupt(format!("invalid lzpHashSize {lzp_hash_size}")));
        }
        Ok(Mode {
            sorter,
            coder,
            lzp_min_len,
            lzp_hash_size,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BlockHeader {
    pub block_size: u32,
    pub data_size: u32,
    pub mode: Mode,
    pub primary_index: u32,
    pub src_adler: u32,
    pub comp_adler: u32,
}

impl BlockHeader {
    /// Serialize to exactly 28 bytes, computing `headerAdler` over the
    /// first 24.
    pub fn write(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut buf = [0u8; BLOCK_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.block_size.to_le_bytes());
        buf[4..8].copy_from_slice(&self.data_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.mode.encode().to_le_bytes());
        buf[12..16].copy_from_slice(&self.primary_index.to_le_bytes());
        buf[16..20].copy_from_slice(&self.src_adler.to_le_bytes());
        buf[20..24].copy_from_slice(&self.comp_adler.to_le_bytes());
        let header_adler = Adler32::of(&buf[0..24]);
        buf[24..28].copy_from_slice(&header_adler.to_le_bytes());
        buf
    }

    /// Validate and parse a header per `inspectBlock`: length, self-check
    /// Adler-32, mode decoding, and the blockSize/dataSize/primaryIndex
    /// sanity bounds.
    pub fn inspect(bytes: &[u8]) -> Result<BlockHeader, Error> {
        if bytes.len() < BLOCK_HEADER_SIZE {
            return Err(Error::UnexpectedEob);
        }
        let bytes = &bytes[..BLOCK_HEADER_SIZE];

        let expected = Adler32::of(&bytes[0..24]);
        let stored = u32::from_le_bytes(bytes[24..28].try_into().unwrap());
        if expected != stored {
            log::warn!("block header Adler-32 mismatch: expected {expected:#x}, found {stored:#x}");
            return Err(Error::data_corrupt("block header Adler-32 mismatch"));
        }

        let block_size = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let data_size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let mode_raw = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        let primary_index = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
        let src_adler = u32::from_le_bytes(bytes[16..20].try_into().unwrap());
        let comp_adler = u32::from_le_bytes(bytes[20..24].try_into().unwrap());

        let mode = Mode::decode(mode_raw)?;

        if block_size < BLOCK_HEADER_SIZE as u32 {
            return Err(Error::data_corrupt("blockSize smaller than header"));
        }
        if block_size as u64 > BLOCK_HEADER_SIZE as u64 + data_size as u64 {
            return Err(Error::data_corrupt("blockSize exceeds header + dataSize"));
        }
        if primary_index > data_size {
            return Err(Error::data_corrupt("primaryIndex exceeds dataSize"));
        }

        Ok(BlockHeader {
            block_size,
            data_size,
            mode,
            primary_index,
            src_adler,
            comp_adler,
        })
    }
}
