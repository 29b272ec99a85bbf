use criterion::{Criterion, criterion_group, criterion_main};
use seal_envelope::prelude::*;
use std::hint::black_box;
use std::sync::Arc;

fn strategy() -> LocalKeyEncryptionStrategy {
    LocalKeyEncryptionStrategy::with_storage(Arc::new(MemoryStorage::new()))
}

fn bench_suites(c: &mut Criterion) {
    for suite in ["AES/KW/NoPadding", "AES/KWP/NoPadding", "AES/GCM/NoPadding"] {
        let strategy = strategy();
        let key = vec![0x5au8; 32];

        // 预先创建密钥加密密钥，避免首次创建计入测量
        let mut warm = KeyEncryptionParams::new()
            .with_key_length_bits(256)
            .with_cipher_suite(suite)
            .with_plaintext_key(key.clone());
        strategy.encrypt_secret_key(&mut warm).unwrap();

        c.bench_function(&format!("{} encrypt 32B", suite), |b| {
            b.iter(|| {
                let mut params = KeyEncryptionParams::new()
                    .with_key_length_bits(256)
                    .with_cipher_suite(suite)
                    .with_plaintext_key(black_box(key.clone()));
                strategy.encrypt_secret_key(&mut params).unwrap();
            });
        });

        c.bench_function(&format!("{} decrypt 32B", suite), |b| {
            b.iter(|| {
                let mut request = warm.to_unwrap_request();
                strategy.decrypt_secret_key(black_box(&mut request)).unwrap();
            });
        });
    }
}

fn bench_local_fs(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let strategy = LocalKeyEncryptionStrategy::from_uri(dir.path().to_str().unwrap()).unwrap();
    let mut warm = KeyEncryptionParams::new().with_plaintext_key(vec![1u8; 16]);
    strategy.encrypt_secret_key(&mut warm).unwrap();

    // 每次调用都会重新读取密钥加密密钥
    c.bench_function("local fs decrypt 16B", |b| {
        b.iter(|| {
            let mut request = warm.to_unwrap_request();
            strategy.decrypt_secret_key(black_box(&mut request)).unwrap();
        });
    });
}

criterion_group!(benches, bench_suites, bench_local_fs);
criterion_main!(benches);
