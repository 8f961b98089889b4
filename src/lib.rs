//! **pgplib** - a layered public-key packet cryptosystem.
//!
//! # Modules
//! | Module | Role |
//! |--------|------|
//! | [`bigint`]       | Fixed-precision multiprecision arithmetic, modexp, CRT decryption |
//! | [`bigint::prime`] | Probabilistic prime search (Fermat witnesses) |
//! | [`cipher`]       | BassOMatic block cipher and its CFB mode |
//! | [`digest`]       | MD4 message digest |
//! | [`rand`]         | Entropy pool, recycling buffer, keyed-cipher PRNG |
//! | [`packet`]       | Tagged-packet wire format, MPI codec, RSA padding |
//! | [`keypair`]      | Key pairs, key IDs, passphrase-locked secret material |
//! | [`keystore`]     | Key-ring search and maintenance |
//! | [`compression`]  | LZ4 compression for literal payloads |
//! | [`pipeline`]     | Compose/decompose state machine tying the above together |
//! | [`confidential`] | Self-zeroing scratch buffers for key material |
//! | [`config`]       | Tunable constants |

pub mod bigint;
pub mod cipher;
pub mod compression;
pub mod config;
pub mod confidential;
pub mod digest;
pub mod error;
pub mod keypair;
pub mod keystore;
pub mod packet;
pub mod pipeline;
pub mod rand;
pub(crate) mod utils;

pub use error::{Error, Result};
