//! Decoder limits.

use crate::gzip::DEFAULT_MAX_INFLATED_LEN;

/// Knobs for a [`Decoder`](crate::Decoder).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Largest inflated `gzip_packed` payload accepted, in bytes.
    pub max_inflated_len: usize,
    /// Shortest `random_bytes` field accepted.
    pub min_random_bytes: usize,
    /// How deeply constructors, vectors and `gzip_packed` envelopes may nest
    /// before the decode is abandoned.
    pub max_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_inflated_len: DEFAULT_MAX_INFLATED_LEN,
            min_random_bytes: 15,
            max_depth: 128,
        }
    }
}
