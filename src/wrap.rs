//! Key wrap/unwrap executor and the registry of cipher suites it dispatches to.

#[cfg(feature = "aead-wrap")]
pub mod aes_gcm_wrap;
#[cfg(feature = "key-wrap")]
pub mod aes_key_wrap;

#[cfg(feature = "aead-wrap")]
pub use aes_gcm_wrap::AesGcmWrap;
#[cfg(feature = "key-wrap")]
pub use aes_key_wrap::{AesKeyWrap, AesKeyWrapPadded};

use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// A dedicated key-wrapping primitive, distinct from bulk payload encryption.
pub trait KeyWrapCipher: Send + Sync {
    /// The cipher-suite descriptor this primitive answers to, e.g. `AES/KW/NoPadding`.
    fn descriptor(&self) -> &'static str;

    /// The algorithm family the key-encryption key must belong to, e.g. `AES`.
    fn family(&self) -> &'static str;

    /// Wraps `plaintext` under `kek`.
    fn wrap(&self, kek: &[u8], algorithm_name: &str, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Unwraps `wrapped` under `kek`.
    fn unwrap(&self, kek: &[u8], algorithm_name: &str, wrapped: &[u8])
    -> Result<Zeroizing<Vec<u8>>>;
}

/// Algorithm families an algorithm name can be recognised as. Longer prefixes first.
const KNOWN_FAMILIES: &[&str] = &["DESede", "DES", "Blowfish", "RC2", "RC4", "ChaCha20", "AES"];

/// Returns the known family `algorithm_name` belongs to, if any.
pub fn algorithm_family(algorithm_name: &str) -> Option<&'static str> {
    let upper = algorithm_name.trim().to_ascii_uppercase();
    KNOWN_FAMILIES
        .iter()
        .find(|family| upper.starts_with(&family.to_ascii_uppercase()))
        .copied()
}

fn check_family(cipher: &dyn KeyWrapCipher, algorithm_name: &str) -> std::result::Result<(), String> {
    match algorithm_family(algorithm_name) {
        Some(family) if !family.eq_ignore_ascii_case(cipher.family()) => Err(format!(
            "algorithm '{}' cannot be used with cipher suite {}",
            algorithm_name,
            cipher.descriptor()
        )),
        _ => Ok(()),
    }
}

/// Maps cipher-suite descriptors to [`KeyWrapCipher`] implementations.
///
/// Lookups ignore ASCII case.
#[derive(Clone)]
pub struct CipherSuiteRegistry {
    suites: HashMap<String, Arc<dyn KeyWrapCipher>>,
}

impl CipherSuiteRegistry {
    pub fn empty() -> Self {
        Self {
            suites: HashMap::new(),
        }
    }

    /// A registry holding every suite compiled into this build.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::empty();
        #[cfg(feature = "key-wrap")]
        {
            registry.register(Arc::new(AesKeyWrap));
            registry.register(Arc::new(AesKeyWrapPadded));
        }
        #[cfg(feature = "aead-wrap")]
        registry.register(Arc::new(AesGcmWrap));
        registry
    }

    /// Registers (or replaces) a cipher under its own descriptor.
    pub fn register(&mut self, cipher: Arc<dyn KeyWrapCipher>) {
        self.suites
            .insert(cipher.descriptor().to_ascii_uppercase(), cipher);
    }

    pub fn resolve(&self, descriptor: &str) -> Result<Arc<dyn KeyWrapCipher>> {
        self.suites
            .get(&descriptor.trim().to_ascii_uppercase())
            .cloned()
            .ok_or_else(|| {
                Error::Configuration(format!("unsupported key wrap cipher suite '{}'", descriptor))
            })
    }

    /// Descriptors of every registered suite, sorted.
    pub fn descriptors(&self) -> Vec<&'static str> {
        let mut descriptors: Vec<_> = self.suites.values().map(|c| c.descriptor()).collect();
        descriptors.sort_unstable();
        descriptors
    }
}

impl Default for CipherSuiteRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Runs wrap and unwrap operations through a [`CipherSuiteRegistry`].
///
/// Every failure is final.
#[derive(Clone, Default)]
pub struct WrapExecutor {
    registry: CipherSuiteRegistry,
}

impl WrapExecutor {
    pub fn new(registry: CipherSuiteRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CipherSuiteRegistry {
        &self.registry
    }

    /// Checks that `cipher_suite` is registered and accepts `algorithm_name`, without
    /// touching any key material.
    pub fn validate_wrap(&self, algorithm_name: &str, cipher_suite: &str) -> Result<()> {
        let cipher = self.prepare(algorithm_name, cipher_suite)?;
        check_family(&*cipher, algorithm_name).map_err(Error::WrapFailure)
    }

    /// Wraps `plaintext` under `kek` with the suite named by `cipher_suite`.
    pub fn wrap(
        &self,
        plaintext: &[u8],
        algorithm_name: &str,
        cipher_suite: &str,
        kek: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = self.prepare(algorithm_name, cipher_suite)?;
        check_family(&*cipher, algorithm_name).map_err(Error::WrapFailure)?;

        debug!(
            "wrapping {}-byte {} key with {}",
            plaintext.len(),
            algorithm_name,
            cipher.descriptor()
        );
        cipher.wrap(kek, algorithm_name, plaintext)
    }

    /// Unwraps `wrapped` under `kek` with the suite named by `cipher_suite`.
    pub fn unwrap(
        &self,
        wrapped: &[u8],
        algorithm_name: &str,
        cipher_suite: &str,
        kek: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let cipher = self.prepare(algorithm_name, cipher_suite)?;
        check_family(&*cipher, algorithm_name).map_err(Error::UnwrapFailure)?;

        debug!(
            "unwrapping {}-byte wrapped {} key with {}",
            wrapped.len(),
            algorithm_name,
            cipher.descriptor()
        );
        cipher.unwrap(kek, algorithm_name, wrapped)
    }

    fn prepare(&self, algorithm_name: &str, cipher_suite: &str) -> Result<Arc<dyn KeyWrapCipher>> {
        if algorithm_name.trim().is_empty() {
            return Err(Error::Configuration(
                "algorithm name must not be empty".to_string(),
            ));
        }
        self.registry.resolve(cipher_suite)
    }
}
