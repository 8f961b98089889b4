//! Universal BigInt/RSA invariants (spec §8).

use pgplib::bigint::BigInt;

const PRECISION: usize = 128;

fn toy_rsa() -> (BigInt, BigInt, BigInt, BigInt, BigInt, BigInt) {
    // p, q prime; n = p*q; e*d = 1 mod lcm(p-1,q-1); u = p^-1 mod q.
    let p = BigInt::from_u64(672_761_215_417, PRECISION);
    let q = BigInt::from_u64(811_856_239_319, PRECISION);
    let n = BigInt::from_bytes_be(
        &546_185_390_308_125_264_381_023u128.to_be_bytes()[6..],
        PRECISION,
    )
    .unwrap();
    let e = BigInt::from_u64(17, PRECISION);
    let d = BigInt::from_bytes_be(
        &321_285_523_709_788_615_838_993u128.to_be_bytes()[6..],
        PRECISION,
    )
    .unwrap();
    let u = BigInt::from_u64(68_736_284_522, PRECISION);
    (p, q, n, e, d, u)
}

#[test]
fn modexp_identity_and_zero_exponent() {
    let m = BigInt::from_u64(97, PRECISION);
    let a = BigInt::from_u64(42, PRECISION);
    let zero = BigInt::from_u64(0, PRECISION);
    let one = BigInt::from_u64(1, PRECISION);

    assert_eq!(a.modexp(&zero, &m).unwrap().compare(&one), 0);
    assert_eq!(a.modexp(&one, &m).unwrap().compare(&a), 0);
}

#[test]
fn modexp_rejects_zero_to_zero() {
    let m = BigInt::from_u64(97, PRECISION);
    let zero = BigInt::from_u64(0, PRECISION);
    assert!(zero.modexp(&zero, &m).is_err());
}

#[test]
fn modmult_matches_mul_then_mod() {
    let m = BigInt::from_u64(1_000_003, PRECISION);
    let a = BigInt::from_u64(123_456, PRECISION);
    let b = BigInt::from_u64(987_654, PRECISION);
    let via_modmult = a.modmult(&b, &m).unwrap();
    let via_full = a.mul_full(&b).modulo(&m).unwrap();
    assert_eq!(via_modmult.compare(&via_full), 0);
}

#[test]
fn crt_decrypt_matches_naive_modexp() {
    let (p, q, n, e, d, u) = toy_rsa();
    let message = BigInt::from_u64(123_456_789, PRECISION);

    let ciphertext = message.modexp(&e, &n).unwrap();
    let naive = ciphertext.modexp(&d, &n).unwrap();
    let crt = BigInt::rsa_decrypt_crt(&ciphertext, &d, &p, &q, &u).unwrap();

    assert_eq!(naive.compare(&message), 0);
    assert_eq!(crt.with_precision(PRECISION).unwrap().compare(&message), 0);
}

#[test]
fn mpi_edge_encoding_zero_and_one() {
    use pgplib::packet::mpi::{read_mpi, write_mpi};
    use std::io::Cursor;

    let zero = BigInt::zero(PRECISION);
    let mut buf = Vec::new();
    write_mpi(&mut buf, &zero).unwrap();
    assert_eq!(buf, vec![0x00, 0x00]);

    let one = BigInt::from_u64(1, PRECISION);
    let mut buf = Vec::new();
    write_mpi(&mut buf, &one).unwrap();
    assert_eq!(buf, vec![0x01, 0x00, 0x01]);

    let mut cursor = Cursor::new(&buf[..]);
    let decoded = read_mpi(&mut cursor, PRECISION).unwrap();
    assert_eq!(decoded.compare(&one), 0);
}

#[test]
fn precision_overflow_is_rejected() {
    let wide = BigInt::from_u64(u64::MAX, 64);
    assert!(wide.with_precision(8).is_err());
}

#[test]
fn modexp_rejects_an_out_of_range_exponent() {
    let m = BigInt::from_u64(97, PRECISION);
    let a = BigInt::from_u64(5, PRECISION);
    let too_big_exponent = BigInt::from_u64(97, PRECISION);
    assert!(a.modexp(&too_big_exponent, &m).is_err());
}

#[test]
fn increment_and_decrement_are_inverses() {
    let a = BigInt::from_u64(41, PRECISION);
    let up = a.increment().unwrap();
    assert_eq!(up.compare(&BigInt::from_u64(42, PRECISION)), 0);
    assert_eq!(up.decrement().unwrap().compare(&a), 0);
}

#[test]
fn decrement_below_zero_is_out_of_range() {
    let zero = BigInt::zero(PRECISION);
    assert!(zero.decrement().is_err());
}

#[test]
fn negate_round_trips() {
    let a = BigInt::from_u64(12345, 64);
    assert_eq!(a.negate().negate().compare(&a), 0);
    assert!(a.negate().is_negative());
    assert!(!a.is_negative());
}

#[test]
fn shift_left_and_right_match_multiply_and_divide_by_a_power_of_two() {
    let a = BigInt::from_u64(0b1011, PRECISION);
    let shifted = a.shift_left(4);
    assert_eq!(shifted.compare(&BigInt::from_u64(0b1011_0000, PRECISION)), 0);
    assert_eq!(shifted.shift_right(4).compare(&a), 0);
}

#[test]
fn rotate_left_then_right_is_the_identity() {
    let a = BigInt::from_u64(0xdead_beef, 64);
    assert_eq!(a.rotate_left().rotate_right().compare(&a), 0);
}

#[test]
fn signed_divide_handles_negative_operands() {
    let ten = BigInt::from_u64(10, 64);
    let three = BigInt::from_u64(3, 64);
    let (q, r) = ten.signed_divide(&three).unwrap();
    assert_eq!(q.compare(&BigInt::from_u64(3, 64)), 0);
    assert_eq!(r.compare(&BigInt::from_u64(1, 64)), 0);

    let neg_ten = ten.negate();
    let (q, r) = neg_ten.signed_divide(&three).unwrap();
    assert!(q.is_negative());
    assert_eq!(r.negate().compare(&BigInt::from_u64(1, 64)), 0);
}

#[test]
fn sqrt_brackets_the_true_root() {
    let n = BigInt::from_u64(1_000_000, PRECISION);
    let root = n.sqrt().unwrap();
    assert_eq!(root.compare(&BigInt::from_u64(1000, PRECISION)), 0);

    let not_a_square = BigInt::from_u64(1_000_001, PRECISION);
    let root = not_a_square.sqrt().unwrap();
    assert_eq!(root.compare(&BigInt::from_u64(1000, PRECISION)), 0);
}

#[test]
fn gcd_matches_known_values() {
    let a = BigInt::from_u64(48, PRECISION);
    let b = BigInt::from_u64(18, PRECISION);
    assert_eq!(a.gcd(&b).unwrap().compare(&BigInt::from_u64(6, PRECISION)), 0);
}

#[test]
fn modinv_produces_a_true_inverse() {
    let a = BigInt::from_u64(17, PRECISION);
    let m = BigInt::from_u64(3120, PRECISION);
    let inv = a.modinv(&m).unwrap();
    let product = a.modmult(&inv, &m).unwrap();
    assert_eq!(product.compare(&BigInt::from_u64(1, PRECISION)), 0);
}

#[test]
fn modinv_rejects_non_coprime_values() {
    let a = BigInt::from_u64(6, PRECISION);
    let m = BigInt::from_u64(9, PRECISION);
    assert!(a.modinv(&m).is_err());
}
