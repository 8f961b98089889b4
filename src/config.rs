//! Tunable constants.
//!
//! The original tool hard-coded these as preprocessor constants; this crate
//! collects them into a struct so callers (and tests) can override them
//! without touching library internals.

/// Tunables for the compose/decompose pipeline and key generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Compression is only applied when it shrinks the literal by at least
    /// this many percent (spec §4.7). The original's gate was 10%.
    pub compression_threshold_pct: u8,
    /// Block size of the symmetric cipher, in bytes. Fixed at 256 by the
    /// cipher's own design; exposed here for assertions and tests rather
    /// than as something callers tune.
    pub cfb_block_size: usize,
    /// Default RSA modulus bit length used by key generation when the
    /// caller doesn't request a specific size.
    pub default_key_bits: u32,
    /// Prefix used when a caller asks the pipeline for a scratch file path
    /// (e.g. while decompressing to a temporary buffer before the literal
    /// packet is re-assembled).
    pub scratch_prefix: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            compression_threshold_pct: 10,
            cfb_block_size: 256,
            default_key_bits: 512,
            scratch_prefix: "pgplib-scratch-",
        }
    }
}
