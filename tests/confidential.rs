//! `ConfidentialBuf`'s wipe property (spec §8 universal invariants).

use pgplib::confidential::ConfidentialBuf;

#[test]
fn wipe_zeros_the_buffer_in_place() {
    let mut buf = ConfidentialBuf::new(vec![0xaau8; 32]);
    buf.wipe();
    assert!(buf.as_slice().iter().all(|&b| b == 0));
    assert_eq!(buf.len(), 32);
}

#[test]
fn zeroed_constructor_starts_at_zero() {
    let buf = ConfidentialBuf::zeroed(16);
    assert!(buf.as_slice().iter().all(|&b| b == 0));
}

#[test]
fn clone_is_independent_of_the_original() {
    let mut original = ConfidentialBuf::new(vec![1, 2, 3, 4]);
    let clone = original.clone();
    original.as_mut_slice()[0] = 0xff;
    assert_eq!(clone.as_slice(), &[1, 2, 3, 4]);
}
