//! Library-wide error and result types.

use std::fmt;
use std::io;

/// Result alias used throughout pgplib.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
///
/// Error messages are kept intentionally terse; callers that need richer
/// context should wrap `Error` in their own type.
#[derive(Debug)]
pub enum Error {
    /// A Cipher Type Byte did not have its high bit set, or named an
    /// unrecognized packet type.
    MalformedPacket(&'static str),
    /// The stream ended before all expected bytes could be read.
    UnexpectedEof,
    /// An MPI declared a bit count exceeding the current [`BigInt`] precision.
    ///
    /// [`BigInt`]: crate::bigint::BigInt
    PrecisionOverflow,
    /// `postunblock` recomputed a checksum that did not match the trailing
    /// checksum field.
    ChecksumError,
    /// `postunblock` found a pad byte count that was zero, or that ran past
    /// the start of the block.
    PadError,
    /// A CFB key-check quad failed to decrypt to its expected duplicate form.
    BadKey,
    /// A secret-key certificate failed `p * q == n` after passphrase unlock.
    BadPassphrase,
    /// No key on the ring matched the requested key ID or userid substring.
    KeyNotFound,
    /// The prime search gave up after its candidate budget was exhausted.
    NoPrimeFound,
    /// The prime search's sieve pass produced zero surviving candidates,
    /// indicating a broken randomness feed.
    NoSuspects,
    /// `modexp`/`modmult` preconditions were violated: base or exponent was
    /// not less than the modulus.
    OutOfRange,
    /// `modexp`/`modmult` was called with a zero modulus.
    ZeroModulus,
    /// `modexp`/`modmult` was called with a negative modulus.
    NegativeModulus,
    /// `modexp(0, 0, m)` was requested; `0^0` is undefined here.
    ZeroToZero,
    /// A structural constraint was violated (message describes which one).
    Parse(&'static str),
    /// An underlying I/O operation failed.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedPacket(s) => write!(f, "malformed packet: {s}"),
            Error::UnexpectedEof => write!(f, "unexpected end of file"),
            Error::PrecisionOverflow => write!(f, "MPI bit count overflows current precision"),
            Error::ChecksumError => write!(f, "checksum mismatch"),
            Error::PadError => write!(f, "invalid pad"),
            Error::BadKey => write!(f, "CFB key-check failed"),
            Error::BadPassphrase => write!(f, "wrong passphrase"),
            Error::KeyNotFound => write!(f, "no matching key on ring"),
            Error::NoPrimeFound => write!(f, "prime search exhausted its candidate budget"),
            Error::NoSuspects => write!(f, "sieve pass produced no candidates"),
            Error::OutOfRange => write!(f, "base or exponent not less than modulus"),
            Error::ZeroModulus => write!(f, "modulus is zero"),
            Error::NegativeModulus => write!(f, "modulus is negative"),
            Error::ZeroToZero => write!(f, "0^0 is undefined"),
            Error::Parse(s) => write!(f, "parse error: {s}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Error::Io(e) = self {
            Some(e)
        } else {
            None
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
