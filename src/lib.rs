//! # Seal-Envelope: Envelope Encryption for Data Keys
//!
//! `seal-envelope` wraps short-lived data-encryption keys under one long-lived
//! key-encryption key (KEK) kept in a shared store, so only wrapped data keys ever need
//! to be persisted next to the data they protect.
//!
//! ## Core Concepts
//!
//! - **`LocalKeyEncryptionStrategy`**: wraps and unwraps data keys carried in a
//!   `KeyEncryptionParams` bag. The KEK is created on the first wrap and never on unwrap.
//! - **`KeyStorage`**: a trait for the store holding the KEK record. `seal-envelope`
//!   provides a local filesystem and an in-memory backend.
//! - **`KeyWrapCipher`**: a dedicated key-wrap primitive, selected by a cipher-suite
//!   descriptor such as `AES/KW/NoPadding`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use seal_envelope::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let strategy = LocalKeyEncryptionStrategy::with_storage(Arc::new(MemoryStorage::new()));
//!
//!     // Wrap
//!     let mut params = KeyEncryptionParams::new().with_plaintext_key(vec![7u8; 16]);
//!     strategy.encrypt_secret_key(&mut params)?;
//!
//!     // Unwrap
//!     let mut request = params.to_unwrap_request();
//!     strategy.decrypt_secret_key(&mut request)?;
//!
//!     assert_eq!(request.plaintext_key_bytes(), Some(&[7u8; 16][..]));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod kek_store;
pub mod params;
pub mod random;
pub mod storage;
pub mod strategy;
pub mod wrap;

pub use error::{Error, Result};
pub use params::KeyEncryptionParams;
pub use strategy::{LocalKeyEncryptionStrategy, SecretKeyEncryptionStrategy};

// --- Prelude ---
// The types most callers need.
pub mod prelude {
    pub use crate::config::{KeyStrategyConfig, Property};
    pub use crate::error::{Error, Result};
    pub use crate::params::KeyEncryptionParams;
    pub use crate::random::{RandomSource, RngRegistry};
    pub use crate::storage::{KeyStorage, LocalFsStorage, MemoryStorage, open_storage};
    pub use crate::strategy::{LocalKeyEncryptionStrategy, SecretKeyEncryptionStrategy};
    pub use crate::wrap::{CipherSuiteRegistry, KeyWrapCipher, WrapExecutor};
}

/// The version of the `seal-envelope` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
