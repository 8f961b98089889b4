//! Prime search soundness (spec §8 universal invariants).

use pgplib::bigint::prime::{is_prime, next_prime};
use pgplib::bigint::BigInt;

const PRECISION: usize = 64;

#[test]
fn small_known_primes_pass() {
    for p in [2u64, 3, 5, 7, 11, 97, 104_729] {
        let v = BigInt::from_u64(p, PRECISION);
        assert!(is_prime(&v).unwrap(), "{p} should be prime");
    }
}

#[test]
fn small_known_composites_fail() {
    for c in [1u64, 4, 6, 8, 9, 15, 100, 104_730] {
        let v = BigInt::from_u64(c, PRECISION);
        assert!(!is_prime(&v).unwrap(), "{c} should be composite");
    }
}

#[test]
fn zero_is_not_prime() {
    let v = BigInt::zero(PRECISION);
    assert!(!is_prime(&v).unwrap());
}

#[test]
fn next_prime_advances_from_a_composite_start() {
    let start = BigInt::from_u64(100, PRECISION);
    let found = next_prime(&start).unwrap();
    assert_eq!(found.compare(&BigInt::from_u64(101, PRECISION)), 0);
}

#[test]
fn next_prime_steps_past_an_already_prime_start() {
    let start = BigInt::from_u64(101, PRECISION);
    let found = next_prime(&start).unwrap();
    assert_eq!(found.compare(&BigInt::from_u64(103, PRECISION)), 0);
}
