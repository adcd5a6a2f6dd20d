//! Streaming block-sorting compressor.
//!
//! Dependency order within this module: [`block_header`] (wire format) →
//! [`coder`] (the pluggable block-sorting collaborator) → [`session`]
//! (the write-path/read-path state machines that tie them together).

pub mod block_header;
pub mod coder;
pub mod oneshot;
pub mod session;

pub use block_header::{BlockHeader, Coder as CoderId, Mode, Sorter, BLOCK_HEADER_SIZE};
pub use coder::{BzCoder, Coder, CompressedBlock};
pub use oneshot::{compress_data, decompress_data, NullSink};
pub use session::{block_size_for_factor, CompressSession, DecompressSession, DEFAULT_BLOCK_SIZE};
