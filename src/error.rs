//! Crate-wide error type.
//!
//! One tagged failure, no implicit recovery: every operation returns its
//! outcome, a session records the last error and refuses further work
//! until reset. `NotCompressible` never escapes this type — it is caught
//! and handled internally by the block-framing layer (store-block
//! fallback); everything else is terminal for the session that raised it.

use std::io;
use thiserror::Error;

/// The six error kinds spec.md §7 names, plus an `Io` passthrough for
/// failures that are not protocol-level (the teacher's `CodecError` and
/// `SuperblockError` both carry the same `#[from] io::Error` arm).
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-provided value violates a documented precondition
    /// (e.g. an `lzpMinLen` out of range, a `maxSize` that does not fit
    /// in 16 bits).
    #[error("bad parameter: {0}")]
    BadParameter(String),

    /// Allocation of a scratch buffer failed.
    #[error("not enough memory: {0}")]
    NotEnoughMemory(String),

    /// Input ended inside a header.
    #[error("unexpected end of block header")]
    UnexpectedEob,

    /// Input ended inside a body.
    #[error("unexpected end of block body")]
    UnexpectedEod,

    /// A checksum, a magic, or a bound check failed.
    #[error("data corrupt: {0}")]
    DataCorrupt(String),

    /// Underlying I/O failure not attributable to the protocol itself.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn data_corrupt(msg: impl Into<String>) -> Self {
        Error::DataCorrupt(msg.into())
    }

    pub fn bad_parameter(msg: impl Into<String>) -> Self {
        Error::BadParameter(msg.into())
    }
}
