//! Defines the custom error type for the `seal-envelope` crate.

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the `seal-envelope` crate.
///
/// Every failure is returned to the immediate caller. Nothing in this crate retries.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration: key path, algorithm name, cipher suite,
    /// random source selector or key length.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No key-encryption key exists at the resolved location. On the unwrap path this
    /// usually means the protected data is unrecoverable without an out-of-band backup.
    #[error("key encryption key not found at configured location ({path})")]
    KeyEncryptionKeyMissing { path: String },

    /// Provisioning a new key-encryption key failed.
    #[error("failed to create key encryption key at {path}")]
    KeyEncryptionKeyCreateFailure {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Wrapping a key failed: invalid key material or an algorithm/suite mismatch.
    #[error("key wrap failed: {0}")]
    WrapFailure(String),

    /// Unwrapping a key failed: invalid key material, an algorithm/suite mismatch,
    /// or a corrupted or tampered wrapped key.
    #[error("key unwrap failed: {0}")]
    UnwrapFailure(String),

    /// I/O failure while reading or writing the key-encryption key record.
    #[error("storage error at {path}")]
    UnderlyingStorage {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The parameter bag lacks the key material the requested operation needs.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

impl Error {
    pub(crate) fn storage(path: &str, source: io::Error) -> Self {
        Error::UnderlyingStorage {
            path: path.to_string(),
            source,
        }
    }

    /// Returns `true` only for storage failures whose I/O kind is transient.
    ///
    /// This is a hint for callers that run their own retry loop; it never changes
    /// what this crate does.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::UnderlyingStorage { source, .. }
            | Error::KeyEncryptionKeyCreateFailure { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}
