//! Multi-precision integer wire encoding.
//!
//! On the wire: a 16-bit little-endian exact bit count, followed by
//! `ceil(bits/8)` magnitude bytes in big-endian (external) byte order.
//! Zero is encoded as bit count 0 with no magnitude bytes. §3, §4.6.

use std::io::{Read, Write};

use crate::bigint::BigInt;
use crate::utils;
use crate::{Error, Result};

/// Read an MPI, validating that its declared bit count fits within
/// `precision` before the magnitude bytes are even read.
pub fn read_mpi<R: Read>(r: &mut R, precision: usize) -> Result<BigInt> {
    let bits = utils::le_u16(r)? as usize;
    if bits > precision {
        return Err(Error::PrecisionOverflow);
    }
    let nbytes = bits.div_ceil(8);
    let bytes = utils::bytesv(r, nbytes)?;
    if bits == 0 {
        return Ok(BigInt::zero(precision));
    }
    let value = BigInt::from_bytes_be(&bytes, precision)?;
    if value.bit_length() != bits {
        return Err(Error::MalformedPacket("MPI bit count does not match magnitude"));
    }
    Ok(value)
}

/// Write an MPI: its exact bit length, then big-endian magnitude bytes.
pub fn write_mpi<W: Write>(w: &mut W, value: &BigInt) -> Result<()> {
    let bits = value.bit_length();
    utils::write_le_u16(w, bits as u16)?;
    if bits == 0 {
        return Ok(());
    }
    w.write_all(&value.to_bytes_be())?;
    Ok(())
}
