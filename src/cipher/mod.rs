//! A 256-byte-block substitution/shredding cipher in CFB mode.
//!
//! Grounded in `BASSLIB.C`/`BASSLIB.H`/`LFSR.C`: a key schedule built from
//! a 256-byte LFSR drives rejection-sampled permutation tables, each round
//! substitutes through a table, disperses bits ("shredding"), and
//! dissipates local patterns across the whole block ("raking"). Decryption
//! runs the same steps in reverse with inverted tables.

mod lfsr;

use crate::confidential::ConfidentialBuf;
use crate::{Error, Result};
use lfsr::Lfsr;

/// Number of permutation tables built per key, matching `NTABLES` in
/// `basslib.h`.
const NTABLES: usize = 8;
/// Plaintext/ciphertext block size in bytes.
pub const BLOCK_SIZE: usize = 256;

/// Decoded meaning of a key control byte (the first byte of the key),
/// matching the bit layout documented in `BASSLIB.H`.
#[derive(Debug, Clone, Copy)]
struct ControlByte {
    rounds: u8,
    shred8ways: bool,
    hardrand: bool,
    rerand: bool,
}

impl ControlByte {
    fn decode(b: u8) -> Self {
        ControlByte {
            rounds: (b & 0x07) + 1,
            shred8ways: b & 0x08 != 0,
            hardrand: b & 0x10 != 0,
            rerand: b & 0x20 != 0,
        }
    }
}

/// A keyed cipher context: the permutation tables and shredder masks
/// derived from a key, reusable across many blocks.
///
/// `Clone` performs a deep copy (the original's `savekeycontext`/
/// `restorekeycontext` aliased a pointer instead; a deep copy is the
/// memory-safe Rust equivalent, see DESIGN.md).
#[derive(Clone)]
pub struct SymKeyContext {
    control: ControlByte,
    tables: [[u8; 256]; NTABLES],
    inverse_tables: [[u8; 256]; NTABLES],
    bitmasks: [u8; NTABLES],
    lfsr: Lfsr,
}

impl SymKeyContext {
    /// Derive a key context. `key` is the control byte followed by up to
    /// 255 key bytes, matching the wire key format in spec §4.4.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::Parse("empty cipher key"));
        }
        if key.len() > 256 {
            return Err(Error::Parse("cipher key longer than 256 bytes"));
        }
        let control = ControlByte::decode(key[0]);
        let mut lfsr = Lfsr::new(&key[1..]);

        let mut tables = [[0u8; 256]; NTABLES];
        for t in tables.iter_mut() {
            build_permutation_table(t, &mut lfsr);
        }
        if control.hardrand {
            // Re-seed from the cipher's own output, matching `hardrand`'s
            // two-tier table regeneration.
            let reseed = bassrand_bytes(&tables, 256, &mut lfsr);
            lfsr = Lfsr::new(&reseed);
            for t in tables.iter_mut() {
                build_permutation_table(t, &mut lfsr);
            }
        }

        let mut inverse_tables = [[0u8; 256]; NTABLES];
        for (t, inv) in tables.iter().zip(inverse_tables.iter_mut()) {
            invert_table(t, inv);
        }

        let mut bitmasks = [0u8; NTABLES];
        for m in bitmasks.iter_mut() {
            *m = find_half_mask(&mut lfsr);
        }

        Ok(SymKeyContext {
            control,
            tables,
            inverse_tables,
            bitmasks,
            lfsr,
        })
    }

    /// Encrypt one 256-byte block in place.
    pub fn encrypt_block(&mut self, block: &mut [u8; BLOCK_SIZE]) {
        for round in 0..self.control.rounds as usize {
            substitute(block, &self.tables[round % NTABLES]);
            shred(block, self.bitmasks[round % NTABLES], self.control.shred8ways);
            rake(block);
            if self.control.rerand {
                self.replenish_tables();
            }
        }
    }

    /// Decrypt one 256-byte block in place, undoing [`encrypt_block`] by
    /// running its steps in reverse order with inverted tables.
    pub fn decrypt_block(&mut self, block: &mut [u8; BLOCK_SIZE]) {
        // Replay the same rerand sequence forward so the context stays in
        // lockstep with the encrypting side, then undo rounds back to front.
        let mut replenish_points = Vec::new();
        if self.control.rerand {
            for _ in 0..self.control.rounds {
                replenish_points.push(self.snapshot_tables());
                self.replenish_tables();
            }
        }
        for round in (0..self.control.rounds as usize).rev() {
            if self.control.rerand {
                let (tables, inverse) = replenish_points.pop().unwrap();
                self.tables = tables;
                self.inverse_tables = inverse;
            }
            unrake(block);
            shred(block, self.bitmasks[round % NTABLES], self.control.shred8ways);
            unsubstitute(block, &self.inverse_tables[round % NTABLES]);
        }
    }

    fn snapshot_tables(&self) -> ([[u8; 256]; NTABLES], [[u8; 256]; NTABLES]) {
        (self.tables, self.inverse_tables)
    }

    fn replenish_tables(&mut self) {
        for t in self.tables.iter_mut() {
            build_permutation_table(t, &mut self.lfsr);
        }
        for (t, inv) in self.tables.iter().zip(self.inverse_tables.iter_mut()) {
            invert_table(t, inv);
        }
    }
}

/// Rejection-sampled permutation table build, matching `buildtbl`: draw
/// bytes from the LFSR and append them unless already present, until all
/// 256 values have appeared exactly once. `stomplfsr` is invoked if a
/// single draw stalls for too long.
fn build_permutation_table(table: &mut [u8; 256], lfsr: &mut Lfsr) {
    const MAX_TICS: u32 = 16383;
    let mut seen = [false; 256];
    let mut len = 0usize;
    let mut tics = MAX_TICS;
    while len < 256 {
        let c = lfsr.next_byte();
        if !seen[c as usize] {
            table[len] = c;
            seen[c as usize] = true;
            len += 1;
        }
        tics -= 1;
        if tics == 0 {
            lfsr.stomp();
            tics = MAX_TICS;
        }
    }
}

fn invert_table(table: &[u8; 256], inverse: &mut [u8; 256]) {
    for (i, &v) in table.iter().enumerate() {
        inverse[v as usize] = i as u8;
    }
}

fn substitute(block: &mut [u8; BLOCK_SIZE], table: &[u8; 256]) {
    for b in block.iter_mut() {
        *b = table[*b as usize];
    }
}

fn unsubstitute(block: &mut [u8; BLOCK_SIZE], inverse: &[u8; 256]) {
    for b in block.iter_mut() {
        *b = inverse[*b as usize];
    }
}

/// Find a byte with exactly 4 of its 8 bits set, matching `halfmask`'s
/// rejection test inside `getmask`.
fn find_half_mask(lfsr: &mut Lfsr) -> u8 {
    loop {
        let c = lfsr.next_byte();
        if c.count_ones() == 4 {
            return c;
        }
    }
}

/// Disperse bits across the block. `shred8ways` splits each byte across
/// 8 destination positions (one bit each); otherwise a coarser 2-way
/// half-mask split is used. Both are self-inverse, so the same function
/// undoes shredding when called again with the same mask.
fn shred(block: &mut [u8; BLOCK_SIZE], mask: u8, shred8ways: bool) {
    if shred8ways {
        for bit in 0..8u32 {
            let bm = 1u8 << bit;
            let mut i = 0;
            let mut j = BLOCK_SIZE - 1;
            while i < j {
                let a_bit = block[i] & bm;
                let b_bit = block[j] & bm;
                block[i] = (block[i] & !bm) | b_bit;
                block[j] = (block[j] & !bm) | a_bit;
                i += 1;
                j -= 1;
            }
        }
    } else {
        let mut i = 0;
        let mut j = BLOCK_SIZE - 1;
        while i < j {
            let a_masked = block[i] & mask;
            let b_masked = block[j] & mask;
            block[i] = (block[i] & !mask) | b_masked;
            block[j] = (block[j] & !mask) | a_masked;
            i += 1;
            j -= 1;
        }
    }
}

/// Cumulative xor pass dissipating local patterns across the block,
/// matching the "rake" step: each byte is xored with a running
/// accumulator seeded from its predecessor.
fn rake(block: &mut [u8; BLOCK_SIZE]) {
    let mut acc = 0u8;
    for b in block.iter_mut() {
        acc ^= *b;
        *b = acc;
    }
}

/// Inverse of [`rake`]: recovers each byte by xoring with the previous
/// (already-recovered) accumulator value.
fn unrake(block: &mut [u8; BLOCK_SIZE]) {
    let mut prev = 0u8;
    for b in block.iter_mut() {
        let acc = *b;
        *b = acc ^ prev;
        prev = acc;
    }
}

/// Drive the cipher's own tables as a pseudo-random byte source, matching
/// `bassrand`'s "hard random" path used by `hardrand` key schedules.
fn bassrand_bytes(tables: &[[u8; 256]; NTABLES], count: usize, lfsr: &mut Lfsr) -> Vec<u8> {
    let mut block = [0u8; BLOCK_SIZE];
    for b in block.iter_mut() {
        *b = lfsr.next_byte();
    }
    for t in tables {
        substitute(&mut block, t);
        rake(&mut block);
    }
    block[..count.min(BLOCK_SIZE)].to_vec()
}

/// Number of bytes reserved for the CFB key-check quad: two random bytes
/// followed by their duplicate (spec §4.4).
pub const KEY_CHECK_LEN: usize = 4;

/// CFB-mode encryption over an arbitrary-length buffer, prefixed with a
/// key-check quad the decrypting side uses to confirm it has the right
/// key before trusting anything else in the stream.
///
/// `iv` seeds the first feedback block; callers typically draw it from
/// fresh randomness and transmit it alongside the ciphertext.
pub fn cfb_encrypt(ctx: &mut SymKeyContext, iv: &[u8; BLOCK_SIZE], check: [u8; 2], plaintext: &[u8]) -> Vec<u8> {
    let mut check_quad = [0u8; KEY_CHECK_LEN];
    check_quad[0] = check[0];
    check_quad[1] = check[1];
    check_quad[2] = check[0];
    check_quad[3] = check[1];

    let mut out = Vec::with_capacity(KEY_CHECK_LEN + plaintext.len());
    let mut feedback = *iv;
    out.extend_from_slice(&cfb_shift(ctx, &mut feedback, &check_quad, true));
    out.extend_from_slice(&cfb_shift(ctx, &mut feedback, plaintext, true));
    out
}

/// CFB-mode decryption. Returns the plaintext with the leading key-check
/// quad stripped, or [`Error::BadKey`] if the quad doesn't decrypt to its
/// expected duplicate form.
pub fn cfb_decrypt(ctx: &mut SymKeyContext, iv: &[u8; BLOCK_SIZE], ciphertext: &[u8]) -> Result<ConfidentialBuf> {
    if ciphertext.len() < KEY_CHECK_LEN {
        return Err(Error::UnexpectedEof);
    }
    let mut feedback = *iv;
    let check_quad = cfb_shift(ctx, &mut feedback, &ciphertext[..KEY_CHECK_LEN], false);
    if check_quad[0] != check_quad[2] || check_quad[1] != check_quad[3] {
        log::warn!("cipher: CFB key-check quad mismatch");
        return Err(Error::BadKey);
    }
    let plain = cfb_shift(ctx, &mut feedback, &ciphertext[KEY_CHECK_LEN..], false);
    Ok(ConfidentialBuf::new(plain))
}

/// The actual CFB feedback loop, shared by encrypt and decrypt: encrypt
/// the feedback block, xor it with the next chunk of data, feed the
/// resulting *ciphertext* chunk back in for the next step. `encrypting`
/// selects whether `data` is plaintext (so the xor output is ciphertext,
/// which also becomes the next feedback) or ciphertext (so the xor output
/// is plaintext, and `data` itself becomes the next feedback).
fn cfb_shift(ctx: &mut SymKeyContext, feedback: &mut [u8; BLOCK_SIZE], data: &[u8], encrypting: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut offset = 0;
    while offset < data.len() {
        let mut keystream = *feedback;
        ctx.encrypt_block(&mut keystream);
        let take = (data.len() - offset).min(BLOCK_SIZE);
        let retain = BLOCK_SIZE - take;
        let mut next_feedback = [0u8; BLOCK_SIZE];
        // On a partial final chunk, the untouched tail of the old feedback
        // shifts down to the front and the new chunk fills the tail.
        next_feedback[..retain].copy_from_slice(&feedback[take..]);
        for i in 0..take {
            let out_byte = data[offset + i] ^ keystream[i];
            out.push(out_byte);
            next_feedback[retain + i] = if encrypting { out_byte } else { data[offset + i] };
        }
        *feedback = next_feedback;
        offset += take;
    }
    out
}
