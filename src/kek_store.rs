//! Provisioning and retrieval of the key-encryption key record.
//!
//! The record is a 4-byte big-endian signed length followed by that many raw key bytes.
//! It is created once, lazily, and read on every call; nothing here caches it, deletes
//! it or rotates it.

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use log::{info, warn};
use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::random::RandomSource;
use crate::storage::KeyStorage;

/// Replication factor requested for a new key-encryption key record.
pub const KEK_REPLICATION: u16 = 5;

/// Largest key length, in bytes, a record may declare.
pub const MAX_KEK_RECORD_LEN: usize = 1024;

const LENGTH_PREFIX_LEN: usize = 4;

/// Converts a key length in bits to bytes.
///
/// The length must be a non-zero multiple of 8 and no larger than
/// [`MAX_KEK_RECORD_LEN`] bytes.
pub fn key_length_bytes(key_length_bits: u32) -> Result<usize> {
    if key_length_bits == 0 || key_length_bits % 8 != 0 {
        return Err(Error::Configuration(format!(
            "key length must be a non-zero multiple of 8 bits, got {}",
            key_length_bits
        )));
    }
    let bytes = (key_length_bits / 8) as usize;
    if bytes > MAX_KEK_RECORD_LEN {
        return Err(Error::Configuration(format!(
            "key length of {} bits exceeds the {}-byte record limit",
            key_length_bits, MAX_KEK_RECORD_LEN
        )));
    }
    Ok(bytes)
}

/// Serialises raw key bytes into the record layout.
pub fn encode_record(key: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut record = Zeroizing::new(vec![0u8; LENGTH_PREFIX_LEN + key.len()]);
    BigEndian::write_i32(&mut record[..LENGTH_PREFIX_LEN], key.len() as i32);
    record[LENGTH_PREFIX_LEN..].copy_from_slice(key);
    record
}

/// Reads one record and returns its key bytes. Trailing bytes are ignored.
pub fn decode_record<R: Read>(mut reader: R) -> io::Result<Zeroizing<Vec<u8>>> {
    let declared = reader.read_i32::<BigEndian>()?;
    if declared < 0 || declared as usize > MAX_KEK_RECORD_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("corrupted key record: declared length {}", declared),
        ));
    }
    let mut key = Zeroizing::new(vec![0u8; declared as usize]);
    reader.read_exact(&mut key)?;
    Ok(key)
}

/// Short SHA-256 fingerprint of a key, safe to log.
pub fn fingerprint(key: &[u8]) -> String {
    Sha256::digest(key)[..8]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Manages the single key-encryption key record on a [`KeyStorage`].
#[derive(Clone)]
pub struct KekStore {
    storage: Arc<dyn KeyStorage>,
}

impl KekStore {
    pub fn new(storage: Arc<dyn KeyStorage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn KeyStorage> {
        &self.storage
    }

    pub fn exists(&self, path: &str) -> Result<bool> {
        self.storage
            .exists(path)
            .map_err(|e| Error::storage(path, e))
    }

    /// Creates the record at `path` with `key_length_bits / 8` random bytes unless one
    /// already exists. Returns `true` if this call created it.
    ///
    /// Creation relies on [`KeyStorage::create_new`] being create-if-absent: when a
    /// concurrent caller wins the race this call returns `false` and the winner's key
    /// stays in place.
    pub fn ensure_exists(
        &self,
        path: &str,
        key_length_bits: u32,
        rng: &dyn RandomSource,
    ) -> Result<bool> {
        if self.exists(path)? {
            return Ok(false);
        }

        let len = key_length_bytes(key_length_bits)?;
        let mut key = Zeroizing::new(vec![0u8; len]);
        rng.fill_bytes(&mut key)
            .map_err(|source| Error::KeyEncryptionKeyCreateFailure {
                path: path.to_string(),
                source,
            })?;
        let record = encode_record(&key);

        match self.storage.create_new(path, &record, KEK_REPLICATION) {
            Ok(()) => {
                info!(
                    "created key encryption key at {} ({} bits, replication {}, fingerprint {})",
                    path,
                    key_length_bits,
                    KEK_REPLICATION,
                    fingerprint(&key)
                );
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(
                    "key encryption key at {} was created concurrently, keeping the existing record",
                    path
                );
                Ok(false)
            }
            Err(source) => Err(Error::KeyEncryptionKeyCreateFailure {
                path: path.to_string(),
                source,
            }),
        }
    }

    /// Reads the key bytes of the record at `path`.
    pub fn load(&self, path: &str) -> Result<Zeroizing<Vec<u8>>> {
        let reader = match self.storage.open(path) {
            Ok(reader) => reader,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::KeyEncryptionKeyMissing {
                    path: path.to_string(),
                });
            }
            Err(e) => return Err(Error::storage(path, e)),
        };
        decode_record(reader).map_err(|e| Error::storage(path, e))
    }
}
