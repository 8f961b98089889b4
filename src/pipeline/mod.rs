//! The compose/decompose state machine.
//!
//! Packets on the wire are not strictly nested: `PKE`/`CONKEY` carry a
//! session key for the `CKE` packet that *follows* them as a sibling,
//! while `CKE`'s decrypted body and `COMPRESSED`'s decompressed body
//! each contain a fresh packet stream of their own (spec §4.7). Each
//! state below consumes one packet and either advances along the
//! current stream (PKE, CONKEY, SKE) or descends into a nested one
//! (CKE, COMPRESSED), until `LITERAL` is reached.

use std::io::Cursor;

use crate::bigint::BigInt;
use crate::cipher::{self, SymKeyContext};
use crate::confidential::ConfidentialBuf;
use crate::digest::MDigest;
use crate::keypair::{KeyId, KeyPair, PublicKey};
use crate::packet::preblock;
use crate::packet::{mpi, read_body, read_header, PacketType};
use crate::utils;
use crate::{Error, Result};

/// Named pipeline states, matching spec §4.7. Kept as an enum purely for
/// diagnostics (`log::trace!` at each transition) - the actual control
/// flow below is a loop over [`read_header`], not a literal dispatch
/// table keyed on this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Inspect,
    DecryptPke,
    VerifySke,
    DecryptCke,
    Decompress,
    StripLiteral,
    ShowKey,
    Done,
}

/// Non-fatal conditions surfaced alongside recovered plaintext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// A signature packet's digest didn't match the recovered plaintext.
    /// Delivery still occurs (spec §4.7/§7) - the plaintext is not
    /// discarded on this warning, only on a hard parse/crypto failure.
    SignatureMismatch,
}

/// Result of decoding a full packet stream.
pub struct Decoded {
    pub plaintext: Vec<u8>,
    pub warnings: Vec<Warning>,
    pub signer_key_id: Option<KeyId>,
}

/// Looks up a secret key by the recipient key ID embedded in a PKE
/// packet. Implemented by the caller's key ring wrapper since unlocking
/// a secret key generally requires a passphrase this module doesn't own.
pub trait SecretKeyLookup {
    fn find_secret(&self, id: &KeyId) -> Option<&KeyPair>;
}

/// Looks up a public key for signature verification.
pub trait PublicKeyLookup {
    fn find_public(&self, id: &KeyId) -> Option<&PublicKey>;
}

/// Decode a top-level packet stream.
pub fn decode(
    input: Vec<u8>,
    secrets: &dyn SecretKeyLookup,
    publics: &dyn PublicKeyLookup,
    precision: usize,
) -> Result<Decoded> {
    let mut stream = input;
    let mut warnings = Vec::new();
    let mut signer_key_id = None;
    let mut pending_signature: Option<(KeyId, BigInt)> = None;
    let mut pending_session_key: Option<ConfidentialBuf> = None;

    loop {
        log::trace!("pipeline: {:?}", PipelineState::Inspect);
        if stream.is_empty() {
            return Err(Error::UnexpectedEof);
        }
        let mut cursor = Cursor::new(&stream[..]);
        let header = read_header(&mut cursor)?;
        let body = read_body(&mut cursor, header.len)?;
        let consumed = cursor.position() as usize;

        match header.ptype {
            PacketType::Pke => {
                log::trace!("pipeline: {:?}", PipelineState::DecryptPke);
                let mut bc = Cursor::new(&body[..]);
                let keyid = utils::bytesa::<8>(&mut bc)?;
                let c = mpi::read_mpi(&mut bc, precision)?;
                let kp = secrets
                    .find_secret(&KeyId(keyid))
                    .ok_or(Error::KeyNotFound)?;
                let m = kp.decrypt(&c)?;
                let modulus_bytelen = kp.public.n.bit_length().div_ceil(8);
                let block = m.to_bytes_be_len(modulus_bytelen);
                let session = preblock::postunblock(&block, false)?;
                pending_session_key = Some(ConfidentialBuf::new(session));
                stream = stream[consumed..].to_vec();
            }
            PacketType::Conkey => {
                let algo = body.first().copied().ok_or(Error::UnexpectedEof)?;
                if algo != 0 {
                    return Err(Error::Parse("unknown session key algorithm"));
                }
                pending_session_key = Some(ConfidentialBuf::new(body[1..].to_vec()));
                stream = stream[consumed..].to_vec();
            }
            PacketType::Ske => {
                log::trace!("pipeline: {:?}", PipelineState::VerifySke);
                let mut bc = Cursor::new(&body[..]);
                let keyid = utils::bytesa::<8>(&mut bc)?;
                let s = mpi::read_mpi(&mut bc, precision)?;
                signer_key_id = Some(KeyId(keyid));
                pending_signature = Some((KeyId(keyid), s));
                stream = stream[consumed..].to_vec();
            }
            PacketType::Cke => {
                log::trace!("pipeline: {:?}", PipelineState::DecryptCke);
                let key = pending_session_key.take().ok_or(Error::KeyNotFound)?;
                let mut ctx = SymKeyContext::new(key.as_slice())?;
                let iv = [0u8; cipher::BLOCK_SIZE];
                let plain = cipher::cfb_decrypt(&mut ctx, &iv, &body)?;
                stream = plain.as_slice().to_vec();
            }
            PacketType::Compressed => {
                log::trace!("pipeline: {:?}", PipelineState::Decompress);
                let algo = body.first().copied().ok_or(Error::UnexpectedEof)?;
                if algo != crate::compression::ALGORITHM_LZ {
                    return Err(Error::Parse("unknown compression algorithm"));
                }
                stream = crate::compression::decompress(&body[1..])?;
            }
            PacketType::Literal => {
                log::trace!("pipeline: {:?}", PipelineState::StripLiteral);
                if let Some((keyid, s)) = pending_signature.take() {
                    if let Some(pk) = publics.find_public(&keyid) {
                        let digest = MDigest::digest(&body);
                        let digest_int = BigInt::from_bytes_be(digest.as_bytes(), precision)?;
                        let recovered = s.modexp(&pk.e, &pk.n)?;
                        if recovered.compare(&digest_int) != 0 {
                            log::warn!(
                                "pipeline: signature mismatch for key {}",
                                keyid.fragment_hex()
                            );
                            warnings.push(Warning::SignatureMismatch);
                        }
                    }
                }
                log::trace!("pipeline: {:?}", PipelineState::Done);
                return Ok(Decoded {
                    plaintext: body,
                    warnings,
                    signer_key_id,
                });
            }
            PacketType::CertPubkey | PacketType::CertSeckey => {
                log::trace!("pipeline: {:?}", PipelineState::ShowKey);
                return Ok(Decoded {
                    plaintext: body,
                    warnings,
                    signer_key_id,
                });
            }
            PacketType::Md => {
                return Err(Error::Parse("detached MD packet has no nested content"));
            }
        }
    }
}

/// Inputs needed to compose an encrypted, optionally signed and
/// compressed packet stream (spec §4.7's encode direction).
pub struct ComposeRequest<'a> {
    pub plaintext: &'a [u8],
    pub signer: Option<&'a KeyPair>,
    pub recipient: &'a PublicKey,
    pub session_key: &'a [u8],
    pub compress: bool,
}

/// Compose `PKE(session) + CKE(session; SKE? + COMPRESSED?(LITERAL))`.
///
/// Mirrors [`decode`]'s layering in reverse: the signature (if any) and
/// literal packet are assembled first, optionally compressed, then
/// CFB-encrypted under `session_key`, then the session key itself is
/// RSA-encrypted for `recipient` and prepended.
pub fn compose(
    req: ComposeRequest,
    config: &crate::config::Config,
    precision: usize,
    rng: &mut dyn crate::bigint::prime::RandomSource,
) -> Result<Vec<u8>> {
    let mut inner = Vec::new();

    if let Some(signer) = req.signer {
        let digest = MDigest::digest(req.plaintext);
        let digest_int = BigInt::from_bytes_be(digest.as_bytes(), precision)?;
        let sig = signer.sign(&digest_int)?;
        let mut body = Vec::new();
        body.extend_from_slice(&signer.public.key_id().0);
        mpi::write_mpi(&mut body, &sig)?;
        crate::packet::write_header(&mut inner, PacketType::Ske, body.len() as u64, false)?;
        inner.extend_from_slice(&body);
    }

    // Compression wraps the literal packet itself (header included), so
    // the decoder can re-enter Inspect on the decompressed body and find
    // a normal LITERAL packet inside.
    let mut literal = Vec::new();
    crate::packet::write_header(&mut literal, PacketType::Literal, req.plaintext.len() as u64, false)?;
    literal.extend_from_slice(req.plaintext);

    let threshold_pct = config.compression_threshold_pct as usize;
    let compressed = if req.compress {
        Some(crate::compression::compress(&literal))
    } else {
        None
    };
    let worth_it = compressed
        .as_ref()
        .is_some_and(|c| c.len() * 100 < literal.len() * (100 - threshold_pct));

    if worth_it {
        let compressed = compressed.unwrap();
        log::trace!(
            "pipeline: compressed {} bytes to {}",
            literal.len(),
            compressed.len()
        );
        let mut cbody = Vec::with_capacity(1 + compressed.len());
        cbody.push(crate::compression::ALGORITHM_LZ);
        cbody.extend_from_slice(&compressed);
        crate::packet::write_header(&mut inner, PacketType::Compressed, cbody.len() as u64, false)?;
        inner.extend_from_slice(&cbody);
    } else {
        inner.extend_from_slice(&literal);
    }

    let mut ctx = SymKeyContext::new(req.session_key)?;
    let iv = [0u8; cipher::BLOCK_SIZE];
    let mut check = [0u8; 2];
    rng.fill_bytes(&mut check);
    let cke_body = cipher::cfb_encrypt(&mut ctx, &iv, check, &inner);

    let mut out = Vec::new();

    let modulus_bytelen = req.recipient.n.bit_length().div_ceil(8);
    let session_block = preblock::preblock(req.session_key, modulus_bytelen, false, preblock::PadStyle::Constant)?;
    let session_int = BigInt::from_bytes_be(&session_block, req.recipient.n.precision())?;
    let encrypted_session = session_int.modexp(&req.recipient.e, &req.recipient.n)?;
    let mut pke_body = Vec::new();
    pke_body.extend_from_slice(&req.recipient.key_id().0);
    mpi::write_mpi(&mut pke_body, &encrypted_session)?;
    crate::packet::write_header(&mut out, PacketType::Pke, pke_body.len() as u64, false)?;
    out.extend_from_slice(&pke_body);

    crate::packet::write_header(&mut out, PacketType::Cke, cke_body.len() as u64, false)?;
    out.extend_from_slice(&cke_body);

    Ok(out)
}
