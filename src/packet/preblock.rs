//! RSA padding: preblock before encryption/signing, postunblock after
//! decryption/verification. §4.6.

use crate::{Error, Result};

/// How the pad bytes are generated.
pub enum PadStyle<'a> {
    /// Encrypting to a public key: pad with unpredictable bytes so equal
    /// plaintexts don't produce equal ciphertexts.
    Random(&'a mut dyn FnMut(&mut [u8])),
    /// Signing: pad with the deterministic constant-pattern scan pattern
    /// postunblock recovers by scanning from the message end.
    Constant,
}

/// Build one RSA input block of exactly `modulus_bytelen` bytes:
/// `[0x00][M][pad][checksum?]`.
///
/// `has_checksum` appends a trailing 16-bit little-endian sum-mod-2^16 of
/// `m`. Fails with [`Error::Parse`] if `m` doesn't fit the usable
/// blocksize (`modulus_bytelen - 1 - 2*has_checksum - 1` bytes, per
/// §4.6).
pub fn preblock(m: &[u8], modulus_bytelen: usize, has_checksum: bool, pad: PadStyle) -> Result<Vec<u8>> {
    if modulus_bytelen < 3 {
        return Err(Error::Parse("modulus too small for preblock framing"));
    }
    let checksum_bytes = if has_checksum { 2 } else { 0 };
    let usable = modulus_bytelen - 1 - checksum_bytes;
    if m.len() > usable {
        return Err(Error::Parse("message too long for modulus"));
    }
    let pad_len = usable - m.len();

    let mut block = vec![0u8; modulus_bytelen];
    block[1..1 + m.len()].copy_from_slice(m);

    let pad_region = &mut block[1 + m.len()..1 + m.len() + pad_len];
    match pad {
        PadStyle::Random(fill) => fill(pad_region),
        PadStyle::Constant => {
            // Byte at position `p` (0 = right after the message) holds
            // its distance from the *far* end of the pad (p+1, capped at
            // 255); postunblock scans backward from the checksum
            // boundary, so it meets the smallest distances first and the
            // largest (possibly saturated-to-zero) ones last, nearest
            // the message.
            for (p, b) in pad_region.iter_mut().enumerate() {
                let distance = p + 1;
                *b = if distance <= 255 { distance as u8 } else { 0 };
            }
        }
    }

    if has_checksum {
        let sum: u16 = m.iter().fold(0u16, |acc, &b| acc.wrapping_add(b as u16));
        let off = modulus_bytelen - 2;
        block[off..off + 2].copy_from_slice(&sum.to_le_bytes());
    }

    Ok(block)
}

/// Recover `M` from a preblocked buffer, verifying the checksum (if
/// present) and the pad's scan-from-end structure.
pub fn postunblock(block: &[u8], has_checksum: bool) -> Result<Vec<u8>> {
    if block.is_empty() || block[0] != 0 {
        return Err(Error::PadError);
    }
    let checksum_bytes = if has_checksum { 2 } else { 0 };
    if block.len() < 1 + checksum_bytes {
        return Err(Error::PadError);
    }
    let payload_region = &block[1..block.len() - checksum_bytes];

    // Scan backward from the end of the pad region (just before the
    // checksum), counting zero bytes, until a non-zero marker byte is
    // found; total pad length is skipped-zeros plus the marker's value.
    let mut zeros = 0usize;
    let mut idx = payload_region.len();
    loop {
        if idx == 0 {
            return Err(Error::PadError);
        }
        idx -= 1;
        if payload_region[idx] == 0 {
            zeros += 1;
            continue;
        }
        let marker = payload_region[idx] as usize;
        let pad_len = zeros + marker;
        if pad_len > payload_region.len() {
            return Err(Error::PadError);
        }
        let message_len = payload_region.len() - pad_len;
        let message = &payload_region[..message_len];

        if has_checksum {
            let expected_sum: u16 = message.iter().fold(0u16, |acc, &b| acc.wrapping_add(b as u16));
            let off = block.len() - 2;
            let actual_sum = u16::from_le_bytes([block[off], block[off + 1]]);
            if actual_sum != expected_sum {
                return Err(Error::ChecksumError);
            }
        }
        return Ok(message.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_constant_pad_with_checksum() {
        let m = b"hello world";
        let block = preblock(m, 64, true, PadStyle::Constant).unwrap();
        assert_eq!(block.len(), 64);
        let recovered = postunblock(&block, true).unwrap();
        assert_eq!(recovered, m);
    }

    #[test]
    fn roundtrip_random_pad_no_checksum() {
        let m = b"short";
        let mut fill = |buf: &mut [u8]| {
            for (i, b) in buf.iter_mut().enumerate() {
                *b = (i as u8).wrapping_add(1).max(1);
            }
        };
        let block = preblock(m, 32, false, PadStyle::Random(&mut fill)).unwrap();
        // Random padding has no recoverable marker by construction here,
        // so this round-trip only exercises preblock's framing, not
        // postunblock (which needs PadStyle::Constant's structure).
        assert_eq!(block.len(), 32);
        assert_eq!(&block[1..1 + m.len()], m);
    }

    #[test]
    fn message_too_long_errors() {
        let m = vec![0u8; 100];
        let err = preblock(&m, 32, false, PadStyle::Constant).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
