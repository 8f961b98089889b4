//! RSA preblock/postunblock round trips beyond the in-module unit tests,
//! covering the pad-byte saturation edge case (spec §9 open question:
//! pad format when padsize > 255).

use pgplib::packet::preblock::{postunblock, preblock, PadStyle};

#[test]
fn pad_longer_than_255_bytes_round_trips() {
    let m = b"short message";
    // usable = 400 - 1 - 2 = 397, pad_len = 397 - 13 = 384 > 255.
    let block = preblock(m, 400, true, PadStyle::Constant).unwrap();
    assert_eq!(block.len(), 400);
    let recovered = postunblock(&block, true).unwrap();
    assert_eq!(recovered, m);
}

#[test]
fn empty_message_round_trips() {
    let block = preblock(b"", 64, true, PadStyle::Constant).unwrap();
    let recovered = postunblock(&block, true).unwrap();
    assert!(recovered.is_empty());
}

#[test]
fn tampered_leading_byte_is_rejected() {
    let m = b"hello";
    let mut block = preblock(m, 32, false, PadStyle::Constant).unwrap();
    block[0] = 0x01;
    assert!(postunblock(&block, false).is_err());
}

#[test]
fn tampered_checksum_is_rejected() {
    let m = b"hello";
    let mut block = preblock(m, 32, true, PadStyle::Constant).unwrap();
    let last = block.len() - 1;
    block[last] ^= 0xff;
    let err = postunblock(&block, true).unwrap_err();
    assert!(matches!(err, pgplib::Error::ChecksumError));
}
