//! # multidust — content-defined deduplication and block-sorting
//! compression pipeline
//!
//! Core guarantees:
//! - Chunk boundaries are content-defined (TTTD rolling hash over Adler-32),
//!   so identical byte runs anywhere in the input produce identical chunks.
//! - Every chunk is addressed by its SHA-1; every multichunk by the SHA-256
//!   of its packed data region.
//! - The streaming compressor's block headers are self-checking (an
//!   Adler-32 over the header itself) and every block falls back to a
//!   verbatim store when compression would not shrink it.
//! - Filters (identity, compression, compression + AES-256-GCM) compose
//!   left-to-right on write and right-to-left on read, each stage
//!   identified by a stable 16-bit ID.
//! - Every chunker, multichunk, and compressor session is exclusive to one
//!   caller: there is no internal lock, and sharing across threads is the
//!   caller's responsibility.
//!
//! Dependency order, leaves first: [`hash`] → [`membuf`] → [`chunk`] →
//! [`multichunk`] → [`compressor`] → [`filter`] → [`repository`].

pub mod chunk;
pub mod compressor;
pub mod crypto;
pub mod error;
pub mod filter;
pub mod hash;
pub mod membuf;
pub mod multichunk;
pub mod perf;
pub mod repository;

pub use chunk::{Chunk, SeekRewind, TttdChunker, MAX_CHUNK_SIZE};
pub use compressor::{BlockHeader, CompressSession, DecompressSession, Mode, BLOCK_HEADER_SIZE};
pub use error::{Error, Result};
pub use filter::{Filter, FilterChain, FilterId};
pub use hash::{Adler32, Sha1Digest, Sha256Digest};
pub use membuf::MemoryBuffer;
pub use multichunk::{max_multichunk_size, set_max_multichunk_size, Multichunk};
pub use repository::{MultichunkEntry, Repository};
