//! Key-ring: an append-prepend log of certificate packets.
//!
//! Grounded in spec §4.8: a ring is just concatenated `CERT_PUBKEY`/
//! `CERT_SECKEY` packets, searched linearly by key-ID fragment or userid
//! substring, with new certificates prepended so they take precedence.

use crate::keypair::{self, PublicKey};
use crate::packet::PacketType;
use crate::{Error, Result};

/// One entry on the ring: enough of the certificate to search and
/// display without unlocking any secret material.
#[derive(Clone)]
pub struct RingEntry {
    pub public: PublicKey,
    /// Raw certificate packet bytes, opaque here - re-serialized as-is
    /// when the ring is rewritten.
    pub raw: Vec<u8>,
}

/// An in-memory view of a key ring, ordered most-recently-added first.
pub struct KeyRing {
    entries: Vec<RingEntry>,
}

impl KeyRing {
    pub fn new() -> Self {
        KeyRing { entries: Vec::new() }
    }

    pub fn from_entries(entries: Vec<RingEntry>) -> Self {
        KeyRing { entries }
    }

    /// Parse a key-ring file's raw bytes: a concatenation of CERT_PUBKEY
    /// and CERT_SECKEY packets, no framing beyond the packets themselves
    /// (spec §4.8, §6). Secret-key entries are indexed by their public
    /// prefix only - unlocking secret material happens later, on demand,
    /// via [`keypair::decode_seckey_cert`].
    pub fn from_bytes(ring_bytes: &[u8], precision: usize) -> Result<Self> {
        let mut entries = Vec::new();
        let mut cursor = std::io::Cursor::new(ring_bytes);
        while (cursor.position() as usize) < ring_bytes.len() {
            let start = cursor.position() as usize;
            let header = crate::packet::read_header(&mut cursor)?;
            let _ = crate::packet::read_body(&mut cursor, header.len)?;
            let end = cursor.position() as usize;
            let raw = ring_bytes[start..end].to_vec();
            let public = match header.ptype {
                PacketType::CertPubkey => keypair::decode_pubkey_cert(&raw, precision)?,
                PacketType::CertSeckey => keypair::decode_seckey_cert_public(&raw, precision)?,
                _ => return Err(Error::Parse("key ring contains a non-certificate packet")),
            };
            entries.push(RingEntry { public, raw });
        }
        Ok(KeyRing { entries })
    }

    pub fn entries(&self) -> &[RingEntry] {
        &self.entries
    }

    /// Linear scan for the first entry whose key ID's low 3 bytes match
    /// `fragment`.
    pub fn find(&self, fragment: &str) -> Result<&RingEntry> {
        let fragment = fragment.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.public.key_id().fragment_hex() == fragment)
            .ok_or(Error::KeyNotFound)
    }

    /// Linear scan for the first entry whose userid contains
    /// `substring`, case-insensitively.
    pub fn find_by_substring(&self, substring: &str) -> Result<&RingEntry> {
        let needle = substring.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.public.userid.to_lowercase().contains(&needle))
            .ok_or(Error::KeyNotFound)
    }

    /// Add a certificate, rejecting duplicates (same key ID already
    /// present) unless it is a compromise record, which always prepends.
    /// New entries are prepended so they take search precedence.
    pub fn add(&mut self, entry: RingEntry) -> Result<()> {
        if !entry.public.is_compromise_record() {
            let id = entry.public.key_id();
            if self.entries.iter().any(|e| e.public.key_id().0 == id.0) {
                return Err(Error::Parse("duplicate key already on ring"));
            }
        }
        log::debug!("keystore: adding key {}", entry.public.key_id().fragment_hex());
        self.entries.insert(0, entry);
        Ok(())
    }

    /// Remove the entry matching `fragment`, returning it.
    pub fn remove(&mut self, fragment: &str) -> Result<RingEntry> {
        let fragment = fragment.to_lowercase();
        let idx = self
            .entries
            .iter()
            .position(|e| e.public.key_id().fragment_hex() == fragment)
            .ok_or(Error::KeyNotFound)?;
        Ok(self.entries.remove(idx))
    }

    /// Flatten back into ring bytes, prepended-first order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for e in &self.entries {
            out.extend_from_slice(&e.raw);
        }
        out
    }
}

impl Default for KeyRing {
    fn default() -> Self {
        Self::new()
    }
}
