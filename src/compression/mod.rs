//! Compression collaborator for the pipeline's compress/decompress phase.
//!
//! The wire format names the compression algorithm by a single byte
//! (§4.6, `COMPRESSED` packet) but treats the compressor itself as a
//! black-box collaborator with two streaming operations: encode, decode.
//! `lz4_flex` fills that role here, the way the teacher wraps `lz4_flex`
//! for its own size-prepended block format.

use crate::{Error, Result};

/// Algorithm byte carried in a `COMPRESSED` packet body. Only one
/// algorithm is implemented; the byte is still on the wire so the format
/// can grow without breaking old packets.
pub const ALGORITHM_LZ: u8 = 1;

/// Compress `data`, producing a size-prepended LZ4 block compatible with
/// [`decompress`].
pub fn compress(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Decompress a buffer produced by [`compress`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data).map_err(|_| Error::Parse("corrupt compressed block"))
}
