//! Adler-32 rolling checksum.
//!
//! Classic modulo-65521 sum-of-sums hash, ported from the original
//! `Hashing::Adler32` (`a`/`b` accumulators, `Base = 65521`). Two
//! checksum orderings exist: [`Adler32::checksum_be`] is the canonical
//! big-endian form used for on-wire serialization (block headers,
//! §3/§6), and [`Adler32::checksum_le`] is the native-order form the
//! chunker uses internally where interoperability does not matter and
//! raw speed does.

/// Running Adler-32 state. `a`/`b` are kept as `u32`s already reduced
/// modulo `BASE`, the same invariant the C++ original keeps with plain
/// `int32` accumulators.
#[derive(Debug, Clone, Copy)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

const BASE: u32 = 65521;
/// Largest number of bytes that can be summed into `a` before `a` could
/// overflow `u32` prior to a `% BASE` reduction (5552 * 255 + BASE < 2^32).
const NMAX: usize = 5552;

impl Adler32 {
    /// Start a fresh rolling checksum (`a = 1, b = 0`).
    pub fn start() -> Self {
        Adler32 { a: 1, b: 0 }
    }

    /// Append a single byte. O(1); defined to produce the same result as
    /// `update(&[b])`.
    #[inline]
    pub fn append(&mut self, byte: u8) {
        self.a += byte as u32;
        if self.a >= BASE {
            self.a -= BASE;
        }
        self.b += self.a;
        if self.b >= BASE {
            self.b -= BASE;
        }
    }

    /// Batched update with periodic reduction every `NMAX` (5552) bytes,
    /// matching the original's `DO16`-unrolled loop.
    pub fn update(&mut self, mut buf: &[u8]) {
        let (mut a, mut b) = (self.a, self.b);
        while !buf.is_empty() {
            let chunk_len = buf.len().min(NMAX);
            let (chunk, rest) = buf.split_at(chunk_len);
            for &byte in chunk {
                a += byte as u32;
                b += a;
            }
            a %= BASE;
            b %= BASE;
            buf = rest;
        }
        self.a = a;
        self.b = b;
    }

    /// Canonical checksum value, big-endian on the wire:
    /// `(b << 16) | a`, byte-swapped for serialization.
    pub fn checksum_be(&self) -> u32 {
        self.checksum_le().swap_bytes()
    }

    /// Native-order checksum: `(b << 16) | a`, not byte-swapped. Faster,
    /// not interoperable across endianness boundaries — used internally
    /// by the chunker's rolling-hash divisor checks.
    #[inline]
    pub fn checksum_le(&self) -> u32 {
        (self.b << 16) | self.a
    }

    /// One-shot: start, update with the whole buffer, return the
    /// canonical big-endian checksum.
    pub fn of(buf: &[u8]) -> u32 {
        let mut h = Adler32::start();
        h.update(buf);
        h.checksum_be()
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Adler32::start()
    }
}
