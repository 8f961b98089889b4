//! Round-trips a short message through the compose/decode pipeline
//! using a toy key pair (small constant primes - never use a modulus
//! this size for anything but demonstrating the wire format).

use pgplib::bigint::prime::RandomSource;
use pgplib::bigint::BigInt;
use pgplib::config::Config;
use pgplib::keypair::{self, KeyId, KeyPair, PublicKey, SecretKey};
use pgplib::pipeline::{self, ComposeRequest, PublicKeyLookup, SecretKeyLookup};
use pgplib::Result;

const PRECISION: usize = 128;

/// Stand-in for the crate's keyed-cipher PRNG (`pgplib::rand`), which
/// needs a live entropy pool this demo doesn't have one of. A real caller
/// would pass `rand::PrimeRandomSource` instead.
struct DemoRng(u64);

impl RandomSource for DemoRng {
    fn fill_bytes(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            *b = (self.0 >> 56) as u8;
        }
    }
}

fn toy_keypair(userid: &str) -> KeyPair {
    // A real (if undersized) 79-bit RSA key: p, q prime, n = p*q,
    // e*d = 1 mod lcm(p-1,q-1), u = p^-1 mod q. Large enough to hold an
    // 8-byte symmetric session key after preblock framing.
    let p = BigInt::from_u64(672_761_215_417, PRECISION);
    let q = BigInt::from_u64(811_856_239_319, PRECISION);
    let n = BigInt::from_bytes_be(&546_185_390_308_125_264_381_023u128.to_be_bytes()[6..], PRECISION).unwrap();
    let e = BigInt::from_u64(17, PRECISION);
    let d = BigInt::from_bytes_be(&321_285_523_709_788_615_838_993u128.to_be_bytes()[6..], PRECISION).unwrap();
    let u = BigInt::from_u64(68_736_284_522, PRECISION);
    KeyPair {
        public: PublicKey {
            n,
            e,
            timestamp: 0,
            userid: userid.to_string(),
        },
        secret: SecretKey { d, p, q, u },
    }
}

struct SingleKey(KeyPair);

impl SecretKeyLookup for SingleKey {
    fn find_secret(&self, id: &KeyId) -> Option<&KeyPair> {
        (self.0.public.key_id().0 == id.0).then_some(&self.0)
    }
}

impl PublicKeyLookup for SingleKey {
    fn find_public(&self, id: &KeyId) -> Option<&pgplib::keypair::PublicKey> {
        (self.0.public.key_id().0 == id.0).then_some(&self.0.public)
    }
}

fn main() -> Result<()> {
    let mut rng = DemoRng(0x1234_5678_9abc_def0);

    // A freshly generated key pair, derived rather than hand-constructed:
    // KeyPair::generate picks p and q, then solves for d via the extended
    // Euclidean algorithm over lcm(p-1, q-1), matching KEYGEN.C.
    let generated = KeyPair::generate(512, 17, 1_700_000_000, "dave@example.com".into(), &mut rng)?;
    let locked = keypair::encode_seckey_cert(&generated, b"correct horse battery staple", &mut rng)?;
    println!("generated a 512-bit key pair, locked secret cert is {} bytes", locked.len());

    let recipient = toy_keypair("alice@example.com");
    let recipient_public = recipient.public.clone();
    let session_key = [0x03u8, 1, 2, 3, 4, 5, 6, 7];

    let plaintext = b"the bass-o-matic is no toy";
    let composed = pipeline::compose(
        ComposeRequest {
            plaintext,
            signer: None,
            recipient: &recipient_public,
            session_key: &session_key,
            compress: false,
        },
        &Config::default(),
        PRECISION,
        &mut rng,
    )?;
    println!("composed {} bytes", composed.len());

    let lookup = SingleKey(recipient);
    let decoded = pipeline::decode(composed, &lookup, &lookup, PRECISION)?;
    println!("recovered: {}", String::from_utf8_lossy(&decoded.plaintext));

    Ok(())
}
