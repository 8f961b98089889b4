//! Low-level I/O primitives shared by the packet codec and key store.
//!
//! Each read function reads exactly the bytes it promises or returns an
//! error - there is no partial-read ambiguity. Write functions mirror the
//! read side so that encode and decode stay visibly symmetric.

use std::io::{Read, Write};

use crate::{Error, Result};

/// Read one byte.
#[inline]
pub(crate) fn u8<R: Read>(r: &mut R) -> Result<u8> {
    let mut b = [0u8; 1];
    r.read_exact(&mut b)?;
    Ok(b[0])
}

/// Write one byte.
#[inline]
pub(crate) fn write_u8<W: Write>(w: &mut W, v: u8) -> Result<()> {
    w.write_all(&[v])?;
    Ok(())
}

/// Read a little-endian `u16`.
#[inline]
pub(crate) fn le_u16<R: Read>(r: &mut R) -> Result<u16> {
    let mut b = [0u8; 2];
    r.read_exact(&mut b)?;
    Ok(u16::from_le_bytes(b))
}

/// Write a little-endian `u16`.
#[inline]
pub(crate) fn write_le_u16<W: Write>(w: &mut W, v: u16) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Read a little-endian `u32`.
#[inline]
pub(crate) fn le_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}

/// Write a little-endian `u32`.
#[inline]
pub(crate) fn write_le_u32<W: Write>(w: &mut W, v: u32) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Read a little-endian `u64`.
#[inline]
pub(crate) fn le_u64<R: Read>(r: &mut R) -> Result<u64> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(u64::from_le_bytes(b))
}

/// Write a little-endian `u64`.
#[inline]
pub(crate) fn write_le_u64<W: Write>(w: &mut W, v: u64) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Read exactly `N` bytes into a fixed-size array.
#[inline]
pub(crate) fn bytesa<const N: usize>(r: &mut impl Read) -> Result<[u8; N]> {
    let mut b = [0u8; N];
    r.read_exact(&mut b)?;
    Ok(b)
}

/// Read exactly `len` bytes into a `Vec`.
#[inline]
pub(crate) fn bytesv<R: Read>(r: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut b = vec![0u8; len];
    r.read_exact(&mut b)?;
    Ok(b)
}

/// Read a Pascal-style string: a 1-byte length followed by that many bytes.
///
/// Used for `UserID` fields (spec §3 `KeyPair`). Decoded lossily, matching
/// how the original tool tolerates non-ASCII userids.
pub(crate) fn read_pascal_string<R: Read>(r: &mut R) -> Result<String> {
    let len = u8(r)? as usize;
    let bytes = bytesv(r, len)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write a Pascal-style string: a 1-byte length followed by the bytes.
///
/// Truncates to 255 bytes - the wire format has no room for more.
pub(crate) fn write_pascal_string<W: Write>(w: &mut W, s: &str) -> Result<()> {
    let bytes = s.as_bytes();
    let len = bytes.len().min(255);
    write_u8(w, len as u8)?;
    w.write_all(&bytes[..len])?;
    Ok(())
}

/// Fail with [`Error::UnexpectedEof`] if `reader` has any bytes left.
pub(crate) fn expect_eof<R: Read>(r: &mut R) -> Result<()> {
    let mut b = [0u8; 1];
    match r.read(&mut b)? {
        0 => Ok(()),
        _ => Err(Error::MalformedPacket("trailing bytes after packet body")),
    }
}
