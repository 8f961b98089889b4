//! Fixed-precision unsigned multiprecision integers.
//!
//! Grounded in `rsalib.c`/`rsalib.h`: a working precision is fixed up front
//! (the `unit`/`global_precision` scheme), arithmetic never grows beyond
//! it, and modular exponentiation is the left-to-right binary method with
//! a little slop room (`SLOP_BITS`) for intermediate products before the
//! next reduction. Rather than a process-wide `global_precision`, each
//! [`BigInt`] carries its own precision so concurrent callers never share
//! mutable state (see DESIGN.md, Open Question: precision scope).
//!
//! Limbs are `u32`, little-endian (least significant limb first), which
//! keeps multiplication intermediates inside a `u64` without overflow.

pub mod prime;

use crate::{Error, Result};

/// Number of extra bits of headroom `modexp` keeps above the modulus's own
/// bit length, mirroring `SLOP_BITS` under Merritt's modmult in `rsalib.h`.
pub(crate) const SLOP_BITS: usize = 33;

/// A fixed-precision non-negative multiprecision integer.
#[derive(Clone, PartialEq, Eq)]
pub struct BigInt {
    /// Little-endian limbs. Always has `precision.div_ceil(32)` elements;
    /// high limbs above the represented value's significance are zero.
    limbs: Vec<u32>,
    /// Working precision in bits. MPIs and arithmetic results must fit
    /// within this many bits or the operation fails with
    /// [`Error::PrecisionOverflow`].
    precision: usize,
}

impl BigInt {
    /// Build a zero value with the given bit precision.
    pub fn zero(precision: usize) -> Self {
        let nlimbs = precision.div_ceil(32).max(1);
        BigInt {
            limbs: vec![0u32; nlimbs],
            precision,
        }
    }

    /// Build from a small value.
    pub fn from_u64(v: u64, precision: usize) -> Self {
        let mut r = BigInt::zero(precision);
        r.limbs[0] = (v & 0xffff_ffff) as u32;
        if r.limbs.len() > 1 {
            r.limbs[1] = (v >> 32) as u32;
        }
        r
    }

    /// Decode a big-endian magnitude, as carried by an MPI packet field.
    ///
    /// `precision` is the working precision to attach to the result; it is
    /// an error for `bytes` to require more bits than `precision` allows.
    pub fn from_bytes_be(bytes: &[u8], precision: usize) -> Result<Self> {
        let mut r = BigInt::zero(precision);
        for (i, &b) in bytes.iter().rev().enumerate() {
            let limb = i / 4;
            if limb >= r.limbs.len() {
                if b != 0 {
                    return Err(Error::PrecisionOverflow);
                }
                continue;
            }
            r.limbs[limb] |= (b as u32) << ((i % 4) * 8);
        }
        if r.bit_length() > precision {
            return Err(Error::PrecisionOverflow);
        }
        Ok(r)
    }

    /// Encode as a big-endian magnitude with no leading zero bytes (other
    /// than a single `0x00` for the zero value), matching how `rsaio.c`
    /// writes the MPI byte payload following its 16-bit bit count.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        let nbytes = self.bit_length().div_ceil(8).max(1);
        let mut out = vec![0u8; nbytes];
        for i in 0..nbytes {
            let limb = i / 4;
            let shift = (i % 4) * 8;
            let byte = if limb < self.limbs.len() {
                (self.limbs[limb] >> shift) as u8
            } else {
                0
            };
            out[nbytes - 1 - i] = byte;
        }
        out
    }

    /// Encode as a big-endian magnitude zero-padded (on the left) to
    /// exactly `len` bytes. Used to recover a fixed-width RSA block after
    /// decryption, where [`Self::to_bytes_be`]'s minimal encoding would
    /// otherwise drop the leading `0x00` byte `preblock` relies on.
    pub fn to_bytes_be_len(&self, len: usize) -> Vec<u8> {
        let minimal = self.to_bytes_be();
        let mut out = vec![0u8; len];
        if minimal.len() <= len {
            out[len - minimal.len()..].copy_from_slice(&minimal);
        } else {
            out.copy_from_slice(&minimal[minimal.len() - len..]);
        }
        out
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Re-express `self` at a different precision, truncating or
    /// zero-extending limbs as needed. Errors if the value doesn't fit.
    pub fn with_precision(&self, precision: usize) -> Result<Self> {
        if self.bit_length() > precision {
            return Err(Error::PrecisionOverflow);
        }
        let nlimbs = precision.div_ceil(32).max(1);
        let mut limbs = vec![0u32; nlimbs];
        for (i, &l) in self.limbs.iter().enumerate() {
            if i < nlimbs {
                limbs[i] = l;
            }
        }
        Ok(BigInt { limbs, precision })
    }

    /// Number of significant bits (0 for the zero value).
    pub fn bit_length(&self) -> usize {
        for (i, &limb) in self.limbs.iter().enumerate().rev() {
            if limb != 0 {
                return i * 32 + (32 - limb.leading_zeros() as usize);
            }
        }
        0
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&l| l == 0)
    }

    pub fn is_even(&self) -> bool {
        self.limbs[0] & 1 == 0
    }

    fn bit(&self, n: usize) -> bool {
        let limb = n / 32;
        if limb >= self.limbs.len() {
            return false;
        }
        (self.limbs[limb] >> (n % 32)) & 1 == 1
    }

    /// Three-way compare: `-1`, `0`, or `1`, matching `mp_compare`.
    pub fn compare(&self, other: &BigInt) -> i32 {
        for i in (0..self.limbs.len().max(other.limbs.len())).rev() {
            let a = self.limbs.get(i).copied().unwrap_or(0);
            let b = other.limbs.get(i).copied().unwrap_or(0);
            if a != b {
                return if a > b { 1 } else { -1 };
            }
        }
        0
    }

    /// `self + other`, truncated (with error) if it overflows precision.
    pub fn add(&self, other: &BigInt) -> Result<BigInt> {
        let prec = self.precision.max(other.precision);
        let nlimbs = prec.div_ceil(32).max(1);
        let mut limbs = vec![0u32; nlimbs];
        let mut carry = 0u64;
        for i in 0..nlimbs {
            let a = self.limbs.get(i).copied().unwrap_or(0) as u64;
            let b = other.limbs.get(i).copied().unwrap_or(0) as u64;
            let sum = a + b + carry;
            limbs[i] = (sum & 0xffff_ffff) as u32;
            carry = sum >> 32;
        }
        let r = BigInt { limbs, precision: prec };
        if carry != 0 || r.bit_length() > prec {
            return Err(Error::PrecisionOverflow);
        }
        Ok(r)
    }

    /// `self - other`. Errors with [`Error::OutOfRange`] if the result
    /// would be negative, matching callers that only ever subtract a
    /// smaller value (`msub`-style usage in modmult/modexp).
    pub fn sub(&self, other: &BigInt) -> Result<BigInt> {
        if self.compare(other) < 0 {
            return Err(Error::OutOfRange);
        }
        let nlimbs = self.limbs.len().max(other.limbs.len());
        let mut limbs = vec![0u32; nlimbs];
        let mut borrow = 0i64;
        for i in 0..nlimbs {
            let a = self.limbs.get(i).copied().unwrap_or(0) as i64;
            let b = other.limbs.get(i).copied().unwrap_or(0) as i64;
            let mut diff = a - b - borrow;
            if diff < 0 {
                diff += 1 << 32;
                borrow = 1;
            } else {
                borrow = 0;
            }
            limbs[i] = diff as u32;
        }
        Ok(BigInt { limbs, precision: self.precision })
    }

    /// Full (unreduced) product, at the combined precision of both
    /// operands so it cannot overflow.
    pub fn mul_full(&self, other: &BigInt) -> BigInt {
        let nlimbs = self.limbs.len() + other.limbs.len();
        let mut limbs = vec![0u32; nlimbs];
        for (i, &a) in self.limbs.iter().enumerate() {
            if a == 0 {
                continue;
            }
            let mut carry = 0u64;
            for (j, &b) in other.limbs.iter().enumerate() {
                let idx = i + j;
                let prod = a as u64 * b as u64 + limbs[idx] as u64 + carry;
                limbs[idx] = (prod & 0xffff_ffff) as u32;
                carry = prod >> 32;
            }
            let mut idx = i + other.limbs.len();
            while carry != 0 {
                let sum = limbs[idx] as u64 + carry;
                limbs[idx] = (sum & 0xffff_ffff) as u32;
                carry = sum >> 32;
                idx += 1;
            }
        }
        BigInt { limbs, precision: nlimbs * 32 }
    }

    /// Unsigned `(quotient, remainder)` via schoolbook long division,
    /// matching `mp_udiv`.
    pub fn divmod(&self, divisor: &BigInt) -> Result<(BigInt, BigInt)> {
        if divisor.is_zero() {
            return Err(Error::ZeroModulus);
        }
        let bits = self.bit_length();
        let mut remainder = BigInt::zero(self.precision.max(divisor.precision) + 32);
        let mut quotient = BigInt::zero(self.precision);
        for i in (0..bits).rev() {
            remainder = remainder.shift_left_1()?;
            if self.bit(i) {
                remainder.limbs[0] |= 1;
            }
            if remainder.compare(divisor) >= 0 {
                remainder = remainder.sub(divisor)?;
                if i / 32 < quotient.limbs.len() {
                    quotient.limbs[i / 32] |= 1 << (i % 32);
                }
            }
        }
        Ok((quotient, remainder.with_precision(divisor.precision.max(1))?))
    }

    fn shift_left_1(&self) -> Result<BigInt> {
        let mut limbs = vec![0u32; self.limbs.len()];
        let mut carry = 0u32;
        for (i, &l) in self.limbs.iter().enumerate() {
            limbs[i] = (l << 1) | carry;
            carry = l >> 31;
        }
        if carry != 0 {
            limbs.push(carry);
        }
        let precision = limbs.len() * 32;
        Ok(BigInt { limbs, precision })
    }

    /// `self mod m`.
    pub fn modulo(&self, m: &BigInt) -> Result<BigInt> {
        Ok(self.divmod(m)?.1)
    }

    /// `(self * other) mod m`, the workhorse behind `modexp`.
    pub fn modmult(&self, other: &BigInt, m: &BigInt) -> Result<BigInt> {
        if m.is_zero() {
            return Err(Error::ZeroModulus);
        }
        let full = self.mul_full(other);
        full.modulo(m)
    }

    /// Left-to-right binary modular exponentiation, matching `mp_modexp`:
    /// square-and-multiply over `exponent`'s bits from the most to least
    /// significant, reducing modulo `m` after every step.
    ///
    /// Requires `self < m` and `m > 0`; `0^0` is rejected as undefined.
    pub fn modexp(&self, exponent: &BigInt, m: &BigInt) -> Result<BigInt> {
        if m.is_zero() {
            return Err(Error::ZeroModulus);
        }
        if self.compare(m) >= 0 {
            return Err(Error::OutOfRange);
        }
        if exponent.compare(m) >= 0 {
            return Err(Error::OutOfRange);
        }
        if self.is_zero() && exponent.is_zero() {
            return Err(Error::ZeroToZero);
        }
        let working_precision = m.bit_length() + SLOP_BITS;
        let base = self.with_precision(working_precision.max(self.bit_length()))?;
        let modulus = m.with_precision(working_precision)?;
        let mut result = BigInt::from_u64(1, working_precision).with_precision(working_precision)?;
        let bits = exponent.bit_length();
        if bits == 0 {
            return Ok(result.modulo(&modulus)?.with_precision(m.precision)?);
        }
        for i in (0..bits).rev() {
            result = result.modmult(&result, &modulus)?;
            if exponent.bit(i) {
                result = result.modmult(&base, &modulus)?;
            }
        }
        result.with_precision(m.precision)
    }

    /// Two's complement negate within the current precision, matching
    /// `mp_neg`: one's complement (bitwise NOT) followed by an increment.
    pub fn negate(&self) -> BigInt {
        let mut limbs: Vec<u32> = self.limbs.iter().map(|&l| !l).collect();
        let mut carry = 1u64;
        for l in limbs.iter_mut() {
            let sum = *l as u64 + carry;
            *l = (sum & 0xffff_ffff) as u32;
            carry = sum >> 32;
            if carry == 0 {
                break;
            }
        }
        let mut r = BigInt { limbs, precision: self.precision };
        r.mask_to_precision();
        r
    }

    /// Whether the top bit of the current precision is set, i.e. `self`
    /// represents a negative value under a two's complement reading
    /// (`mp_tstminus`).
    pub fn is_negative(&self) -> bool {
        self.bit(self.precision.max(1) - 1)
    }

    /// Clear any bits above `precision` left over from a carry/negate that
    /// touched a full limb.
    fn mask_to_precision(&mut self) {
        let used_bits = self.precision % 32;
        if used_bits != 0 {
            if let Some(top) = self.limbs.last_mut() {
                *top &= (1u32 << used_bits) - 1;
            }
        }
    }

    /// Increment by one, matching `mp_inc`. Fails with
    /// [`Error::PrecisionOverflow`] if the increment carries out of the
    /// current precision.
    pub fn increment(&self) -> Result<BigInt> {
        self.add(&BigInt::from_u64(1, self.precision))
    }

    /// Decrement by one, matching `mp_dec`. Fails with [`Error::OutOfRange`]
    /// if `self` is already zero, since this type has no representation for
    /// negative results.
    pub fn decrement(&self) -> Result<BigInt> {
        self.sub(&BigInt::from_u64(1, self.precision))
    }

    /// Rotate left by one bit within the current precision, wrapping the
    /// vacated low bit in from whatever bit fell off the top - matching
    /// `mp_rotate_left(r, 0)` chained with the carry it returns.
    pub fn rotate_left(&self) -> BigInt {
        let bits = self.precision.max(1);
        let carry_out = self.bit(bits - 1);
        let mut r = self.shift_left_1_truncating();
        if carry_out {
            r.limbs[0] |= 1;
        }
        r
    }

    /// Rotate right by one bit within the current precision, matching
    /// `mp_rotate_right`.
    pub fn rotate_right(&self) -> BigInt {
        let bits = self.precision.max(1);
        let carry_out = self.bit(0);
        let mut r = self.shift_right(1);
        if carry_out {
            let top_limb = (bits - 1) / 32;
            let top_bit = (bits - 1) % 32;
            r.limbs[top_limb] |= 1 << top_bit;
        }
        r
    }

    /// Logical shift left by `n` bits within the current precision; bits
    /// shifted past the top are dropped, matching `mp_shift_left` (which is
    /// `mp_rotate_left` with a zero incoming carry, repeated).
    pub fn shift_left(&self, n: usize) -> BigInt {
        let mut r = self.clone();
        for _ in 0..n {
            r = r.shift_left_1_truncating();
        }
        r
    }

    /// Shift one bit left, discarding any bit above the current precision
    /// (unlike the growing [`Self::shift_left_1`] helper `divmod` uses).
    fn shift_left_1_truncating(&self) -> BigInt {
        let mut limbs = vec![0u32; self.limbs.len()];
        let mut carry = 0u32;
        for (i, &l) in self.limbs.iter().enumerate() {
            limbs[i] = (l << 1) | carry;
            carry = l >> 31;
        }
        let mut r = BigInt { limbs, precision: self.precision };
        r.mask_to_precision();
        r
    }

    /// Logical shift right by `n` bits, matching `mp_shift_right`.
    pub fn shift_right(&self, n: usize) -> BigInt {
        let mut limbs = self.limbs.clone();
        for _ in 0..n {
            let mut carry = 0u32;
            for l in limbs.iter_mut().rev() {
                let next_carry = *l & 1;
                *l = (*l >> 1) | (carry << 31);
                carry = next_carry;
            }
        }
        BigInt { limbs, precision: self.precision }
    }

    /// Signed divide, matching `mp_div`: either operand may be negative
    /// under a two's complement reading of the current precision. Returns
    /// `(quotient, remainder)` with the remainder taking the dividend's
    /// sign and the quotient taking the sign of `dividend ^ divisor`.
    pub fn signed_divide(&self, divisor: &BigInt) -> Result<(BigInt, BigInt)> {
        let dividend_negative = self.is_negative();
        let divisor_negative = divisor.is_negative();
        let abs_dividend = if dividend_negative { self.negate() } else { self.clone() };
        let abs_divisor = if divisor_negative { divisor.negate() } else { divisor.clone() };

        let (mut quotient, mut remainder) = abs_dividend.divmod(&abs_divisor)?;
        if dividend_negative {
            remainder = remainder.negate();
        }
        if dividend_negative ^ divisor_negative {
            quotient = quotient.negate();
        }
        Ok((quotient, remainder))
    }

    /// Integer square root via Newton's method, matching `mp_sqrt`'s
    /// contract (`quotient^2 <= self < (quotient+1)^2`) without replicating
    /// its two-bits-at-a-time digit recurrence, which nothing in this crate
    /// calls into directly.
    pub fn sqrt(&self) -> Result<BigInt> {
        if self.is_zero() {
            return Ok(BigInt::zero(self.precision));
        }
        let one = BigInt::from_u64(1, self.precision);
        let mut x = one.shift_left(self.bit_length().div_ceil(2));
        loop {
            let (div_q, _) = self.divmod(&x)?;
            let next = x.add(&div_q)?.shift_right(1);
            if next.compare(&x) >= 0 {
                break;
            }
            x = next;
        }
        // x now satisfies x*x <= self < (x+1)*(x+1); nudge down if Newton's
        // method overshot on the final step.
        while x.mul_full(&x).compare(self) > 0 {
            x = x.sub(&one)?;
        }
        Ok(x)
    }

    /// Greatest common divisor via Euclid's algorithm, matching `gcd` in
    /// `KEYGEN.C`.
    pub fn gcd(&self, other: &BigInt) -> Result<BigInt> {
        let prec = self.precision.max(other.precision);
        let mut a = self.with_precision(prec)?;
        let mut b = other.with_precision(prec)?;
        while !b.is_zero() {
            let r = a.modulo(&b)?.with_precision(prec)?;
            a = b;
            b = r;
        }
        Ok(a)
    }

    /// Modular multiplicative inverse via the extended Euclidean
    /// algorithm, matching `inv` in `KEYGEN.C`: finds `x` such that
    /// `self * x mod modulus = 1`. Fails with [`Error::Parse`] if `self`
    /// and `modulus` are not coprime.
    pub fn modinv(&self, modulus: &BigInt) -> Result<BigInt> {
        // A couple of slop bits so the Bezout coefficients (bounded by
        // modulus in magnitude) never carry out of precision mid-loop.
        let prec = self.precision.max(modulus.precision) + 2;
        let mut r0 = modulus.with_precision(prec)?;
        let mut r1 = self.with_precision(prec)?;
        let mut t0_mag = BigInt::zero(prec);
        let mut t0_neg = false;
        let mut t1_mag = BigInt::from_u64(1, prec);
        let mut t1_neg = false;

        while !r1.is_zero() {
            let (q, rem) = r0.divmod(&r1)?;
            let rem = rem.with_precision(prec)?;
            let qt1 = q.mul_full(&t1_mag).with_precision(prec)?;
            let (new_mag, new_neg) = signed_sub(&t0_mag, t0_neg, &qt1, t1_neg)?;
            r0 = r1;
            r1 = rem;
            t0_mag = t1_mag;
            t0_neg = t1_neg;
            t1_mag = new_mag;
            t1_neg = new_neg;
        }

        let one = BigInt::from_u64(1, prec);
        if r0.compare(&one) != 0 {
            return Err(Error::Parse("value has no inverse modulo the given modulus"));
        }

        let n_wide = modulus.with_precision(prec)?;
        let reduced = t0_mag.modulo(&n_wide)?;
        let result = if t0_neg && !reduced.is_zero() {
            n_wide.sub(&reduced)?
        } else {
            reduced
        };
        result.with_precision(self.precision.max(modulus.precision))
    }

    /// RSA decryption via the Chinese Remainder Theorem shortcut, matching
    /// `rsa_decrypt`: `M = p2 + p * ((q2 - p2) * u mod q)`, where
    /// `p2 = C^d mod p` and `q2 = C^d mod q`.
    ///
    /// `u` is the precomputed `p^-1 mod q`.
    pub fn rsa_decrypt_crt(
        ciphertext: &BigInt,
        d: &BigInt,
        p: &BigInt,
        q: &BigInt,
        u: &BigInt,
    ) -> Result<BigInt> {
        let precision = p.precision.max(q.precision) * 2 + SLOP_BITS;
        let c = ciphertext.with_precision(precision.max(ciphertext.bit_length()))?;
        let p_wide = p.with_precision(precision)?;
        let q_wide = q.with_precision(precision)?;
        let d_wide = d.with_precision(precision)?;
        let u_wide = u.with_precision(precision)?;

        let cp = c.modulo(&p_wide)?;
        let cq = c.modulo(&q_wide)?;
        let p2 = cp.modexp(&d_wide, &p_wide)?;
        let q2 = cq.modexp(&d_wide, &q_wide)?;

        let q2_wide = q2.with_precision(precision)?;
        let p2_wide = p2.with_precision(precision)?;
        let diff = if q2_wide.compare(&p2_wide) >= 0 {
            q2_wide.sub(&p2_wide)?
        } else {
            // (q2 - p2) mod q, kept non-negative per the fixed-precision
            // unsigned representation: add q until non-negative.
            let d = p2_wide.sub(&q2_wide)?;
            let m = d.modulo(&q_wide)?;
            if m.is_zero() {
                m
            } else {
                q_wide.sub(&m)?
            }
        };
        let t = diff.modmult(&u_wide, &q_wide)?;
        let m = p_wide.mul_full(&t).add(&p2_wide)?;
        m.with_precision(p.precision + q.precision)
    }
}

/// Add two sign-and-magnitude values, used internally by
/// [`BigInt::modinv`] to track Bezout coefficients without giving the
/// public API a general signed representation.
fn signed_add(a_mag: &BigInt, a_neg: bool, b_mag: &BigInt, b_neg: bool) -> Result<(BigInt, bool)> {
    if a_neg == b_neg {
        let mag = a_mag.add(b_mag)?;
        let neg = a_neg && !mag.is_zero();
        return Ok((mag, neg));
    }
    match a_mag.compare(b_mag) {
        0 => Ok((BigInt::zero(a_mag.precision.max(b_mag.precision)), false)),
        c if c > 0 => {
            let mag = a_mag.sub(b_mag)?;
            Ok((mag, a_neg))
        }
        _ => {
            let mag = b_mag.sub(a_mag)?;
            Ok((mag, b_neg))
        }
    }
}

/// Subtract two sign-and-magnitude values: `a - b = a + (-b)`.
fn signed_sub(a_mag: &BigInt, a_neg: bool, b_mag: &BigInt, b_neg: bool) -> Result<(BigInt, bool)> {
    signed_add(a_mag, a_neg, b_mag, !b_neg)
}

impl std::fmt::Debug for BigInt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BigInt({:x?}, {} bits)", self.to_bytes_be(), self.precision)
    }
}
