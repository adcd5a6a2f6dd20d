//! Filter ID 0: the no-op passthrough.

use crate::error::Result;
use crate::filter::Filter;

pub struct IdentityFilter;

impl Filter for IdentityFilter {
    fn apply_forward(&self, src: &[u8]) -> Result<Vec<u8>> {
        Ok(src.to_vec())
    }

    fn apply_reverse(&self, src: &[u8]) -> Result<Vec<u8>> {
        Ok(src.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bytes() {
        let f = IdentityFilter;
        let data = vec![0u8, 1, 2, 255, 254];
        assert_eq!(f.apply_forward(&data).unwrap(), data);
        assert_eq!(f.apply_reverse(&data).unwrap(), data);
    }
}
