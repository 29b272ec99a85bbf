//! Traits for abstracting the shared store that holds key-encryption key records.
// 中文: 用于抽象密钥加密密钥记录所在共享存储的 Trait。

use std::io::{self, Read};

/// Defines the storage operations the key-encryption key store needs.
///
/// Record paths are `/`-separated strings such as `/accumulo/crypto/secret/keyEncryptionKey`.
/// Readers returned by [`KeyStorage::open`] are released when dropped, so every exit path
/// of a caller, including `?` returns, closes them.
pub trait KeyStorage: Send + Sync {
    /// Returns `true` if a record exists at `path`.
    fn exists(&self, path: &str) -> io::Result<bool>;

    /// Opens the record at `path` for reading.
    ///
    /// Fails with [`io::ErrorKind::NotFound`] when there is no record.
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send + '_>>;

    /// Creates the record at `path` with `contents`, requesting `replication` copies.
    ///
    /// Implementations must only create the record if none exists, and must fail with
    /// [`io::ErrorKind::AlreadyExists`] otherwise. Readers must never observe a partially
    /// written record. Backends that cannot replicate may ignore `replication`.
    fn create_new(&self, path: &str, contents: &[u8], replication: u16) -> io::Result<()>;
}
