//! Two-tier randomness: an entropy pool fed by keystroke timing, a
//! stirring recycler, and a strong keyed-cipher PRNG seeded from both.
//!
//! Grounded in spec §4.3 and `random.c`'s `randpool`/`recyclepool`/
//! `bassrand` trio. Keystroke capture itself is the embedding
//! application's job (it owns the UI event loop); this module exposes
//! [`EntropyPool::keypress`] for the caller to feed samples into.

use crate::bigint::prime::RandomSource;
use crate::cipher::{SymKeyContext, BLOCK_SIZE};
use crate::confidential::ConfidentialBuf;
use crate::{Error, Result};

/// Fixed capacity of the entropy pool, in bytes.
const POOL_CAPACITY: usize = 1024;

/// A byte stack filled by keystroke-timing samples.
///
/// Never replenished from a pseudo-random source - if the pool runs dry,
/// callers must wait for more keystrokes.
pub struct EntropyPool {
    buf: Vec<u8>,
    last_key: Option<u8>,
    prev_key: Option<u8>,
}

impl EntropyPool {
    pub fn new() -> Self {
        EntropyPool {
            buf: Vec::with_capacity(POOL_CAPACITY),
            last_key: None,
            prev_key: None,
        }
    }

    /// Feed one keystroke sample. `key` identifies the physical key
    /// (used only for the auto-repeat filter); `counter_low` is the low
    /// byte of a free-running counter sampled at the moment of the
    /// keypress.
    ///
    /// Auto-repeat filter: a key identical to the immediately prior key
    /// is dropped, unless the prior key was itself not a repeat of the
    /// one before it - i.e. exactly one repeated keystroke is let
    /// through, then further repeats of the same key are dropped until a
    /// different key intervenes.
    pub fn keypress(&mut self, key: u8, counter_low: u8) {
        let is_repeat = self.last_key == Some(key);
        let accept = !is_repeat || self.prev_key != self.last_key;

        if accept && self.buf.len() < POOL_CAPACITY {
            self.buf.push(counter_low);
        }
        self.prev_key = self.last_key;
        self.last_key = Some(key);
    }

    /// Bytes currently available without blocking.
    pub fn available(&self) -> usize {
        self.buf.len()
    }

    /// Move up to `n` bytes out of the pool (FIFO), for use by
    /// [`RecyclingBuffer::reserve`]. Returns fewer than `n` bytes if the
    /// pool doesn't have enough.
    fn take(&mut self, n: usize) -> Vec<u8> {
        let take = n.min(self.buf.len());
        self.buf.drain(..take).collect()
    }

    pub fn flush(&mut self) {
        self.buf.clear();
        self.last_key = None;
        self.prev_key = None;
    }
}

impl Default for EntropyPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer of entropy-sourced bytes that gets cycled through repeatedly,
/// each full cycle stirred by a 16-bit LCG, matching `pseudorand =
/// seed*31421+6927 & 0xffff` in `random.c`.
pub struct RecyclingBuffer {
    buf: Vec<u8>,
    cursor: usize,
    lcg_state: u16,
}

impl RecyclingBuffer {
    pub fn new() -> Self {
        RecyclingBuffer {
            buf: Vec::new(),
            cursor: 0,
            lcg_state: 1,
        }
    }

    /// Move `nbytes` (`reserve` takes a byte count; spec names it in
    /// bits, rounded up here) from `pool` into the recycler, replacing
    /// whatever was cycling through it before.
    pub fn reserve(&mut self, nbytes: usize, pool: &mut EntropyPool) -> Result<()> {
        let drawn = pool.take(nbytes);
        if drawn.len() < nbytes {
            return Err(Error::Parse("entropy pool exhausted"));
        }
        self.buf = drawn;
        self.cursor = 0;
        Ok(())
    }

    fn step_lcg(&mut self) -> u8 {
        self.lcg_state = self.lcg_state.wrapping_mul(31421).wrapping_add(6927);
        (self.lcg_state & 0xff) as u8
    }

    /// Read the next byte, cycling through the buffer and xoring every
    /// byte with successive LCG outputs on each full wraparound.
    pub fn next_byte(&mut self) -> Option<u8> {
        if self.buf.is_empty() {
            return None;
        }
        if self.cursor == self.buf.len() {
            for b in self.buf.iter_mut() {
                *b ^= self.step_lcg();
            }
            self.cursor = 0;
        }
        let b = self.buf[self.cursor];
        self.cursor += 1;
        Some(b)
    }

    pub fn flush(&mut self) {
        self.buf.clear();
        self.cursor = 0;
    }
}

impl Default for RecyclingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed layout of the persistent seed file: a 64-byte symmetric key
/// (control byte + up to 63 key bytes) followed by 256 bytes of PRNG
/// state, matching spec §6.
pub const SEED_FILE_LEN: usize = 64 + BLOCK_SIZE;

/// A keyed-cipher pseudo-random generator seeded from the persistent
/// seed file, a timestamp, and a fresh entropy draw.
pub struct StrongRandom {
    ctx: SymKeyContext,
    state_block: [u8; BLOCK_SIZE],
}

impl StrongRandom {
    /// Build from a seed file's bytes (see [`SEED_FILE_LEN`]), combined
    /// with a timestamp and entropy draw so that even a stale seed file
    /// doesn't produce repeated output across runs. `timestamp` is
    /// seconds since the Unix epoch.
    pub fn from_seed(seed_bytes: &[u8; SEED_FILE_LEN], timestamp: u32, pool: &mut EntropyPool) -> Result<Self> {
        let mut key = [0u8; 64];
        key.copy_from_slice(&seed_bytes[..64]);
        let ts = timestamp.to_le_bytes();
        for i in 0..4 {
            key[1 + i] ^= ts[i];
        }
        let fresh = pool.take(64);
        for (i, b) in fresh.iter().enumerate() {
            key[i % 64] ^= b;
        }
        let ctx = SymKeyContext::new(&key)?;
        let mut state_block = [0u8; BLOCK_SIZE];
        state_block.copy_from_slice(&seed_bytes[64..]);
        Ok(StrongRandom { ctx, state_block })
    }

    /// Build a fresh seed file (all zero key/state) from true entropy
    /// when none exists on disk yet, matching spec §4.3's "if the seed
    /// file is empty or absent it is created from true entropy."
    pub fn fresh(timestamp: u32, pool: &mut EntropyPool) -> Result<Self> {
        let mut seed_bytes = [0u8; SEED_FILE_LEN];
        let draw = pool.take(SEED_FILE_LEN);
        seed_bytes[..draw.len()].copy_from_slice(&draw);
        Self::from_seed(&seed_bytes, timestamp, pool)
    }

    /// Produce `n` bytes of strong pseudorandom output, each xored with a
    /// fresh byte from `pool` (spec: "output is xored with fresh entropy
    /// bytes"). Advances and returns the new on-disk state to persist.
    pub fn next_bytes(&mut self, n: usize, pool: &mut EntropyPool) -> ConfidentialBuf {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            self.ctx.encrypt_block(&mut self.state_block);
            let take = (n - out.len()).min(BLOCK_SIZE);
            for i in 0..take {
                let entropy_byte = pool.take(1).first().copied().unwrap_or(0);
                out.push(self.state_block[i] ^ entropy_byte);
            }
        }
        ConfidentialBuf::new(out)
    }

    /// Serialize the current key context and PRNG state back into the
    /// 64+256 byte on-disk layout, so the caller can rewrite the seed
    /// file after every use (spec §4.3).
    pub fn to_seed_bytes(&self, control_and_key: &[u8; 64]) -> [u8; SEED_FILE_LEN] {
        let mut out = [0u8; SEED_FILE_LEN];
        out[..64].copy_from_slice(control_and_key);
        out[64..].copy_from_slice(&self.state_block);
        out
    }
}

/// Adapts [`StrongRandom`] to [`RandomSource`] for prime generation,
/// drawing fresh entropy from a pool on every call.
pub struct PrimeRandomSource<'a> {
    pub strong: &'a mut StrongRandom,
    pub pool: &'a mut EntropyPool,
}

impl<'a> RandomSource for PrimeRandomSource<'a> {
    fn fill_bytes(&mut self, buf: &mut [u8]) {
        let bytes = self.strong.next_bytes(buf.len(), self.pool);
        buf.copy_from_slice(bytes.as_slice());
    }
}
