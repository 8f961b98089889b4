//! Scratch buffers that zero themselves on every exit path.
//!
//! Passphrases, unlocked secret-key material, and CFB keystream state all
//! pass through a [`ConfidentialBuf`] rather than a bare `Vec<u8>`, so a
//! panic mid-decrypt doesn't leave key material sitting in memory.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// An owned byte buffer that is zeroed when dropped.
#[derive(ZeroizeOnDrop)]
pub struct ConfidentialBuf {
    bytes: Vec<u8>,
}

impl ConfidentialBuf {
    /// Wrap an existing buffer. Takes ownership so no unzeroed copy survives
    /// in the caller's scope.
    pub fn new(bytes: Vec<u8>) -> Self {
        ConfidentialBuf { bytes }
    }

    /// Allocate `len` zeroed bytes.
    pub fn zeroed(len: usize) -> Self {
        ConfidentialBuf {
            bytes: vec![0u8; len],
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Overwrite the contents with zeros without dropping the buffer.
    pub fn wipe(&mut self) {
        self.bytes.zeroize();
    }
}

impl Clone for ConfidentialBuf {
    fn clone(&self) -> Self {
        ConfidentialBuf {
            bytes: self.bytes.clone(),
        }
    }
}

impl std::fmt::Debug for ConfidentialBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfidentialBuf")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}
