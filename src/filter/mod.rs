//! Filter chain: pluggable `applyForward`/`applyReverse` transforms
//! between multichunk bytes and the backing store, identified by a
//! stable 16-bit ID carried in the multichunk header.
//!
//! Filters compose left-to-right on write (`apply_forward` of filter 0,
//! then filter 1, …) and right-to-left on read.

pub mod compress;
pub mod encrypt;
pub mod identity;

use crate::error::Result;

/// The pipeline recognizes at least these IDs (spec §4.7); the mapping
/// from ID to concrete filter instance is external to the core — callers
/// build their own [`FilterChain`] by ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FilterId {
    Identity = 0,
    Compress = 1,
    CompressAndEncrypt = 2,
}

impl FilterId {
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0 => Some(FilterId::Identity),
            1 => Some(FilterId::Compress),
            2 => Some(FilterId::CompressAndEncrypt),
            _ => None,
        }
    }
}

/// One stage of the chain: a one-way transform with its inverse.
pub trait Filter {
    fn apply_forward(&self, src: &[u8]) -> Result<Vec<u8>>;
    fn apply_reverse(&self, src: &[u8]) -> Result<Vec<u8>>;
}

/// An ordered sequence of filters, applied left-to-right on write and
/// right-to-left on read.
pub struct FilterChain {
    stages: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    pub fn new(stages: Vec<Box<dyn Filter>>) -> Self {
        FilterChain { stages }
    }

    pub fn identity() -> Self {
        FilterChain::new(vec![Box::new(identity::IdentityFilter)])
    }

    pub fn apply_forward(&self, data: &[u8]) -> Result<Vec<u8>> {
        log::trace!("filter chain forward: {} stage(s), {} input bytes", self.stages.len(), data.len());
        let mut buf = data.to_vec();
        for stage in &self.stages {
            buf = stage.apply_forward(&buf)?;
        }
        Ok(buf)
    }

    pub fn apply_reverse(&self, data: &[u8]) -> Result<Vec<u8>> {
        log::trace!("filter chain reverse: {} stage(s), {} input bytes", self.stages.len(), data.len());
        let mut buf = data.to_vec();
        for stage in self.stages.iter().rev() {
            buf = stage.apply_reverse(&buf)?;
        }
        Ok(buf)
    }
}
