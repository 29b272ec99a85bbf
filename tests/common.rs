//!
//! 集成测试的通用辅助函数
//!
#![allow(dead_code)]

use seal_envelope::config::Property;
use seal_envelope::random::RandomSource;
use seal_envelope::KeyEncryptionParams;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 初始化测试日志，重复调用是安全的。
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 构造一个携带明文数据密钥的参数包。
pub fn wrap_request(algorithm: &str, key_length_bits: u32, key: &[u8]) -> KeyEncryptionParams {
    KeyEncryptionParams::new()
        .with_algorithm_name(algorithm)
        .with_key_length_bits(key_length_bits)
        .with_plaintext_key(key.to_vec())
}

/// 指向自定义实例目录与密钥位置的参数包。
pub fn located_request(instance_dir: &str, key_location: &str, key: &[u8]) -> KeyEncryptionParams {
    KeyEncryptionParams::new()
        .with_option(Property::InstanceDfsDir, instance_dir)
        .with_option(Property::KeyStrategyKeyLocation, key_location)
        .with_plaintext_key(key.to_vec())
}

/// 可预测的数据密钥，第 `seed` 个密钥的每个字节都不同。
pub fn data_key(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| seed.wrapping_mul(31).wrapping_add(i as u8)).collect()
}

/// 统计调用次数的随机源，输出可预测，用于确认密钥只生成一次。
#[derive(Default)]
pub struct CountingRandom {
    calls: AtomicUsize,
}

impl CountingRandom {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RandomSource for CountingRandom {
    fn fill_bytes(&self, dest: &mut [u8]) -> io::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        for (i, b) in dest.iter_mut().enumerate() {
            *b = (call as u8).wrapping_add(i as u8).wrapping_mul(7);
        }
        Ok(())
    }
}
