//! Asymmetric signature verification benchmarks
//!
//! Set `RSA_JWT` and `RSA_PUB_DER_PATH` to benchmark RS256 against an
//! externally issued token; otherwise a key pair is generated.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::env;
use std::fs;
use tokenseal::*;

fn rsa_keys() -> (Key, Key) {
    let mut rng = rand::thread_rng();
    let private = rsa::RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate RSA key pair");
    let signing = Key::rsa_private(&private).expect("Failed to load RSA private key");
    let verifying = signing.public_key();
    (signing, verifying)
}

fn claims() -> MapClaims {
    MapClaims::new()
        .with("sub", "user123")
        .with("iat", 1_516_239_022)
        .with("exp", 9_999_999_999u64)
}

/// Benchmark RS256 signature verification
fn bench_rs256_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("rs256_verification");

    let (raw, verifying) = match (env::var("RSA_JWT").ok(), env::var("RSA_PUB_DER_PATH").ok()) {
        (Some(token), Some(path)) => {
            let der = fs::read(&path).expect("Failed to read public key DER");
            let key = Key::rsa_public_der(&der).expect("Failed to load public key DER");
            (token, key)
        }
        _ => {
            let (signing, verifying) = rsa_keys();
            let raw = Token::new(RS256, claims())
                .signed_string(&signing)
                .expect("Failed to sign RS256 token");
            (raw, verifying)
        }
    };

    let parser = Parser::builder()
        .allow_algorithms(AlgorithmPolicy::rs256_only())
        .without_claims_validation()
        .build();

    group.bench_function("verify", |b| {
        b.iter(|| {
            let token = parser
                .parse(black_box(&raw), known_keyfunc("RS256", verifying.clone()))
                .unwrap();
            black_box(token.valid())
        });
    });

    group.finish();
}

/// Benchmark PS256 verification with automatic and fixed salt detection
fn bench_ps256_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("ps256_verification");

    let (signing, verifying) = rsa_keys();
    let raw = Token::new(PS256, claims())
        .signed_string(&signing)
        .expect("Failed to sign PS256 token");

    let auto = Parser::builder()
        .allow_algorithms(AlgorithmPolicy::rsa_pss_any())
        .without_claims_validation()
        .build();

    group.bench_function("auto_salt", |b| {
        b.iter(|| {
            let token = auto
                .parse(black_box(&raw), known_keyfunc("PS256", verifying.clone()))
                .unwrap();
            black_box(token.valid())
        });
    });

    let registry = std::sync::Arc::new(SigningMethodRegistry::new());
    let strict = PS256.with_verify_salt(PssSaltLength::EqualsHash);
    registry.register("PS256", move || Box::new(strict));
    let fixed = Parser::builder()
        .signing_methods(registry)
        .without_claims_validation()
        .build();

    group.bench_function("fixed_salt", |b| {
        b.iter(|| {
            let token = fixed
                .parse(black_box(&raw), known_keyfunc("PS256", verifying.clone()))
                .unwrap();
            black_box(token.valid())
        });
    });

    group.finish();
}

/// Benchmark Ed25519 signing and verification
fn bench_eddsa(c: &mut Criterion) {
    let mut group = c.benchmark_group("eddsa");

    let signing = Key::ed25519_private_seed(&[7u8; 32]).expect("Failed to load Ed25519 seed");
    let verifying = signing.public_key();
    let token = Token::new(EDDSA, claims());
    let raw = token
        .signed_string(&signing)
        .expect("Failed to sign EdDSA token");

    group.bench_function("sign", |b| {
        b.iter(|| black_box(token.signed_string(&signing).unwrap()));
    });

    let parser = Parser::builder()
        .allow_algorithms(AlgorithmPolicy::eddsa_only())
        .without_claims_validation()
        .build();

    group.bench_function("verify", |b| {
        b.iter(|| {
            let token = parser
                .parse(black_box(&raw), known_keyfunc("EdDSA", verifying.clone()))
                .unwrap();
            black_box(token.valid())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_rs256_verification,
    bench_ps256_verification,
    bench_eddsa
);
criterion_main!(benches);
