//! Tagged-packet wire format.
//!
//! Every packet on the wire (message packets and key-ring certificates
//! alike) begins with a Cipher Type Byte: high bit set, a 5-bit type field,
//! and a 2-bit length-of-length selector. §4.6.

pub mod mpi;
pub mod preblock;

use std::io::Read;

use crate::utils;
use crate::{Error, Result};

/// Packet type tags, matching the CTB type field (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// Public-key-encrypted session key.
    Pke = 1,
    /// Signature (signed digest).
    Ske = 2,
    /// Detached digest-plus-timestamp packet.
    Md = 3,
    /// Symmetric session key, carried inside a PKE body.
    Conkey = 4,
    /// Secret-key certificate.
    CertSeckey = 5,
    /// Public-key certificate.
    CertPubkey = 6,
    /// Compressed body.
    Compressed = 8,
    /// Symmetric-CFB-encrypted body.
    Cke = 9,
    /// Raw literal payload.
    Literal = 12,
}

impl PacketType {
    fn from_u8(v: u8) -> Result<Self> {
        Ok(match v {
            1 => PacketType::Pke,
            2 => PacketType::Ske,
            3 => PacketType::Md,
            4 => PacketType::Conkey,
            5 => PacketType::CertSeckey,
            6 => PacketType::CertPubkey,
            8 => PacketType::Compressed,
            9 => PacketType::Cke,
            12 => PacketType::Literal,
            _ => return Err(Error::MalformedPacket("unrecognized packet type")),
        })
    }
}

/// Length-of-length selector: the CTB's low 2 bits, where 3 is a
/// sentinel for "indefinite, read to EOF" rather than an 8-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LengthKind {
    OneByte,
    TwoByte,
    FourByte,
    Indefinite,
}

impl LengthKind {
    fn from_bits(b: u8) -> Self {
        match b & 0x03 {
            0 => LengthKind::OneByte,
            1 => LengthKind::TwoByte,
            2 => LengthKind::FourByte,
            _ => LengthKind::Indefinite,
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            LengthKind::OneByte => 0,
            LengthKind::TwoByte => 1,
            LengthKind::FourByte => 2,
            LengthKind::Indefinite => 3,
        }
    }
}

/// A decoded packet header: its type and body length (`None` for
/// indefinite-length packets, whose body runs to EOF).
pub struct Header {
    pub ptype: PacketType,
    pub len: Option<u64>,
}

/// Read a CTB and its length field.
pub fn read_header<R: Read>(r: &mut R) -> Result<Header> {
    let ctb = utils::u8(r)?;
    if ctb & 0x80 == 0 {
        return Err(Error::MalformedPacket("CTB missing high bit"));
    }
    let ptype = PacketType::from_u8((ctb & 0x7c) >> 2)?;
    let len = match LengthKind::from_bits(ctb) {
        LengthKind::OneByte => Some(utils::u8(r)? as u64),
        LengthKind::TwoByte => Some(utils::le_u16(r)? as u64),
        LengthKind::FourByte => Some(utils::le_u32(r)? as u64),
        LengthKind::Indefinite => None,
    };
    Ok(Header { ptype, len })
}

/// Write a CTB and length field for a body of `body_len` bytes.
/// `indefinite` forces the "read to EOF" sentinel even though the true
/// length is known, matching how the original writes CFB-streamed
/// output without knowing its final size up front.
pub fn write_header<W: std::io::Write>(
    w: &mut W,
    ptype: PacketType,
    body_len: u64,
    indefinite: bool,
) -> Result<()> {
    let kind = if indefinite {
        LengthKind::Indefinite
    } else if body_len <= 0xff {
        LengthKind::OneByte
    } else if body_len <= 0xffff {
        LengthKind::TwoByte
    } else {
        LengthKind::FourByte
    };
    let ctb = 0x80 | ((ptype as u8) << 2) | kind.to_bits();
    utils::write_u8(w, ctb)?;
    match kind {
        LengthKind::OneByte => utils::write_u8(w, body_len as u8)?,
        LengthKind::TwoByte => {
            w.write_all(&(body_len as u16).to_le_bytes())?;
        }
        LengthKind::FourByte => {
            w.write_all(&(body_len as u32).to_le_bytes())?;
        }
        LengthKind::Indefinite => {}
    }
    Ok(())
}

/// Read a packet's body: either exactly `len` bytes, or (for indefinite
/// length) everything remaining in the reader.
pub fn read_body<R: Read>(r: &mut R, len: Option<u64>) -> Result<Vec<u8>> {
    match len {
        Some(n) => utils::bytesv(r, n as usize),
        None => {
            let mut buf = Vec::new();
            r.read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}
