//! Key-ring search/add/remove invariants (spec §4.8 / §8).

use pgplib::bigint::prime::RandomSource;
use pgplib::bigint::BigInt;
use pgplib::keypair::{self, KeyPair, PublicKey, SecretKey};
use pgplib::keystore::{KeyRing, RingEntry};

const PRECISION: usize = 128;

/// Deterministic stand-in for the crate's keyed-cipher PRNG.
struct TestRng(u64);

impl RandomSource for TestRng {
    fn fill_bytes(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            *b = (self.0 >> 56) as u8;
        }
    }
}

fn entry(n_seed: u64, e: u64, userid: &str) -> RingEntry {
    let n = BigInt::from_u64(n_seed, PRECISION);
    let e = BigInt::from_u64(e, PRECISION);
    RingEntry {
        public: PublicKey { n, e, timestamp: 0, userid: userid.to_string() },
        raw: vec![0u8; 4],
    }
}

#[test]
fn new_entries_take_search_precedence() {
    let mut ring = KeyRing::new();
    ring.add(entry(1111, 17, "alice@example.com")).unwrap();
    ring.add(entry(2222, 17, "alice@newdomain.com")).unwrap();

    let found = ring.find_by_substring("alice").unwrap();
    assert_eq!(found.public.userid, "alice@newdomain.com");
}

#[test]
fn duplicate_key_id_is_rejected() {
    let mut ring = KeyRing::new();
    ring.add(entry(1111, 17, "alice@example.com")).unwrap();
    let err = ring.add(entry(1111, 17, "alice-dup@example.com")).unwrap_err();
    assert!(matches!(err, pgplib::Error::Parse(_)));
}

#[test]
fn compromise_record_always_prepends() {
    let mut ring = KeyRing::new();
    ring.add(entry(1111, 17, "alice@example.com")).unwrap();
    // e = 0 marks a compromise record (spec §3); it shares a key ID with
    // the live entry above but must not be rejected as a duplicate.
    ring.add(entry(1111, 0, "alice@example.com (revoked)")).unwrap();
    assert_eq!(ring.entries().len(), 2);
    assert!(ring.entries()[0].public.is_compromise_record());
}

#[test]
fn find_by_fragment_and_substring_are_case_insensitive() {
    let mut ring = KeyRing::new();
    ring.add(entry(1111, 17, "Alice Example <alice@example.com>")).unwrap();

    let fragment = ring.entries()[0].public.key_id().fragment_hex();
    assert!(ring.find(&fragment.to_uppercase()).is_ok());
    assert!(ring.find_by_substring("ALICE EXAMPLE").is_ok());
    assert!(ring.find_by_substring("nobody").is_err());
}

#[test]
fn remove_drops_the_matching_entry_only() {
    let mut ring = KeyRing::new();
    ring.add(entry(1111, 17, "alice@example.com")).unwrap();
    ring.add(entry(2222, 17, "bob@example.com")).unwrap();

    let fragment = ring.find_by_substring("bob").unwrap().public.key_id().fragment_hex();
    let removed = ring.remove(&fragment).unwrap();
    assert_eq!(removed.public.userid, "bob@example.com");
    assert_eq!(ring.entries().len(), 1);
    assert_eq!(ring.entries()[0].public.userid, "alice@example.com");
}

#[test]
fn to_bytes_preserves_prepend_order() {
    let mut ring = KeyRing::new();
    ring.add(entry(1111, 17, "first")).unwrap();
    ring.add(entry(2222, 17, "second")).unwrap();
    // `second` was added last, so it was prepended and its raw bytes come
    // first in the flattened ring.
    let flat = ring.to_bytes();
    assert_eq!(flat.len(), 8);
}

#[test]
fn a_ring_file_of_mixed_certificates_round_trips_through_bytes() {
    let alice = PublicKey {
        n: BigInt::from_u64(111_111_111_111, PRECISION),
        e: BigInt::from_u64(17, PRECISION),
        timestamp: 111,
        userid: "alice@example.com".to_string(),
    };
    let bob_secret = SecretKey {
        d: BigInt::from_bytes_be(&321_285_523_709_788_615_838_993u128.to_be_bytes()[6..], PRECISION).unwrap(),
        p: BigInt::from_u64(672_761_215_417, PRECISION),
        q: BigInt::from_u64(811_856_239_319, PRECISION),
        u: BigInt::from_u64(68_736_284_522, PRECISION),
    };
    let bob = KeyPair {
        public: PublicKey {
            n: BigInt::from_bytes_be(&546_185_390_308_125_264_381_023u128.to_be_bytes()[6..], PRECISION).unwrap(),
            e: BigInt::from_u64(17, PRECISION),
            timestamp: 222,
            userid: "bob@example.com".to_string(),
        },
        secret: bob_secret,
    };

    let mut ring_bytes = Vec::new();
    ring_bytes.extend_from_slice(&keypair::encode_pubkey_cert(&alice).unwrap());
    ring_bytes.extend_from_slice(&keypair::encode_seckey_cert(&bob, b"hunter2", &mut TestRng(7)).unwrap());

    let ring = KeyRing::from_bytes(&ring_bytes, PRECISION).unwrap();
    assert_eq!(ring.entries().len(), 2);
    assert!(ring.find_by_substring("alice").is_ok());
    let bob_entry = ring.find_by_substring("bob").unwrap();
    let unlocked = keypair::decode_seckey_cert(&bob_entry.raw, b"hunter2", PRECISION).unwrap();
    assert_eq!(unlocked.public.userid, "bob@example.com");
}
