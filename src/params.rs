//! The parameter bag passed through a key encryption call.

use secrecy::{ExposeSecret, SecretBox};
use std::collections::HashMap;
use zeroize::Zeroizing;

use crate::config::{
    DEFAULT_ALGORITHM_NAME, DEFAULT_KEY_LENGTH_BITS, DEFAULT_SECURE_RNG,
    DEFAULT_SECURE_RNG_PROVIDER, Property,
};
use crate::error::{Error, Result};

/// Caller-owned parameters for wrapping or unwrapping one data key.
///
/// A wrap reads `plaintext_key` and fills `wrapped_key` and `key_encryption_key_id`.
/// An unwrap reads `wrapped_key` and fills `plaintext_key`. A failed call leaves the bag
/// as it was.
#[derive(Debug)]
pub struct KeyEncryptionParams {
    /// Algorithm name the data key is tagged with, e.g. `AES`.
    pub algorithm_name: String,
    /// Wrap cipher-suite descriptor. `None` falls back to the
    /// `crypto.default.key.strategy.cipher.suite` option, then to the built-in default.
    pub cipher_suite: Option<String>,
    /// Data key length in bits.
    pub key_length_bits: u32,
    /// The data key in the clear.
    pub plaintext_key: Option<SecretBox<[u8]>>,
    /// The data key wrapped under the key-encryption key.
    pub wrapped_key: Option<Vec<u8>>,
    /// Identifies the key-encryption key used by the last wrap (its storage path).
    pub key_encryption_key_id: Option<String>,
    /// Random source name used if a key-encryption key has to be created.
    pub random_number_generator: String,
    /// Random source provider used if a key-encryption key has to be created.
    pub random_number_generator_provider: String,
    /// Every configuration option, including the key location and instance directory.
    pub options: HashMap<String, String>,
}

impl Default for KeyEncryptionParams {
    fn default() -> Self {
        Self {
            algorithm_name: DEFAULT_ALGORITHM_NAME.to_string(),
            cipher_suite: None,
            key_length_bits: DEFAULT_KEY_LENGTH_BITS,
            plaintext_key: None,
            wrapped_key: None,
            key_encryption_key_id: None,
            random_number_generator: DEFAULT_SECURE_RNG.to_string(),
            random_number_generator_provider: DEFAULT_SECURE_RNG_PROVIDER.to_string(),
            options: HashMap::new(),
        }
    }
}

impl KeyEncryptionParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a bag from an options map, taking algorithm name, key length, random
    /// source selectors and cipher suite from the options (or their defaults).
    pub fn from_options(options: HashMap<String, String>) -> Result<Self> {
        let key_length = Property::CipherKeyLength.resolve(&options);
        let key_length_bits = key_length.parse::<u32>().map_err(|_| {
            Error::Configuration(format!(
                "{} must be a whole number of bits, got '{}'",
                Property::CipherKeyLength.key(),
                key_length
            ))
        })?;

        Ok(Self {
            algorithm_name: Property::CipherAlgorithmName.resolve(&options).to_string(),
            cipher_suite: Property::KeyStrategyCipherSuite
                .lookup(&options)
                .map(str::to_string),
            key_length_bits,
            plaintext_key: None,
            wrapped_key: None,
            key_encryption_key_id: None,
            random_number_generator: Property::SecureRng.resolve(&options).to_string(),
            random_number_generator_provider: Property::SecureRngProvider
                .resolve(&options)
                .to_string(),
            options,
        })
    }

    pub fn with_algorithm_name(mut self, algorithm_name: impl Into<String>) -> Self {
        self.algorithm_name = algorithm_name.into();
        self
    }

    pub fn with_cipher_suite(mut self, cipher_suite: impl Into<String>) -> Self {
        self.cipher_suite = Some(cipher_suite.into());
        self
    }

    pub fn with_key_length_bits(mut self, key_length_bits: u32) -> Self {
        self.key_length_bits = key_length_bits;
        self
    }

    pub fn with_plaintext_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        let key: Zeroizing<Vec<u8>> = Zeroizing::new(key.into());
        self.set_plaintext_key(&key);
        self
    }

    pub fn with_wrapped_key(mut self, wrapped: impl Into<Vec<u8>>) -> Self {
        self.wrapped_key = Some(wrapped.into());
        self
    }

    pub fn with_random_number_generator(
        mut self,
        rng: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        self.random_number_generator = rng.into();
        self.random_number_generator_provider = provider.into();
        self
    }

    pub fn with_option(mut self, property: Property, value: impl Into<String>) -> Self {
        self.options.insert(property.key().to_string(), value.into());
        self
    }

    /// Borrows the plaintext key bytes, if present.
    pub fn plaintext_key_bytes(&self) -> Option<&[u8]> {
        self.plaintext_key.as_ref().map(|k| k.expose_secret())
    }

    /// Stores a copy of `key` as the plaintext key.
    pub fn set_plaintext_key(&mut self, key: &[u8]) {
        self.plaintext_key = Some(SecretBox::new(Box::from(key)));
    }

    /// Cipher suite for this call: the bag's own descriptor, else the configured one,
    /// else the built-in default.
    pub fn resolved_cipher_suite(&self) -> &str {
        self.cipher_suite
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Property::KeyStrategyCipherSuite.resolve(&self.options))
    }

    /// A fresh bag carrying this bag's configuration and wrapped key, without the
    /// plaintext key. This is what a reader typically rebuilds from persisted metadata.
    pub fn to_unwrap_request(&self) -> Self {
        Self {
            algorithm_name: self.algorithm_name.clone(),
            cipher_suite: self.cipher_suite.clone(),
            key_length_bits: self.key_length_bits,
            plaintext_key: None,
            wrapped_key: self.wrapped_key.clone(),
            key_encryption_key_id: self.key_encryption_key_id.clone(),
            random_number_generator: self.random_number_generator.clone(),
            random_number_generator_provider: self.random_number_generator_provider.clone(),
            options: self.options.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_options_applies_defaults() -> Result<()> {
        let params = KeyEncryptionParams::from_options(HashMap::new())?;
        assert_eq!(params.algorithm_name, "AES");
        assert_eq!(params.key_length_bits, 128);
        assert_eq!(params.random_number_generator, "OsRng");
        assert_eq!(params.random_number_generator_provider, "rand_core");
        assert_eq!(params.resolved_cipher_suite(), "AES/KW/NoPadding");
        Ok(())
    }

    #[test]
    fn from_options_reads_configured_values() -> Result<()> {
        let mut options = HashMap::new();
        options.insert(Property::CipherKeyLength.key().to_string(), "256".to_string());
        options.insert(
            Property::KeyStrategyCipherSuite.key().to_string(),
            "AES/GCM/NoPadding".to_string(),
        );
        let params = KeyEncryptionParams::from_options(options)?;
        assert_eq!(params.key_length_bits, 256);
        assert_eq!(params.cipher_suite.as_deref(), Some("AES/GCM/NoPadding"));
        Ok(())
    }

    #[test]
    fn non_numeric_key_length_is_rejected() {
        let mut options = HashMap::new();
        options.insert(Property::CipherKeyLength.key().to_string(), "lots".to_string());
        assert!(matches!(
            KeyEncryptionParams::from_options(options),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn bag_suite_wins_over_configured_suite() {
        let params = KeyEncryptionParams::new()
            .with_option(Property::KeyStrategyCipherSuite, "AES/KWP/NoPadding")
            .with_cipher_suite("AES/GCM/NoPadding");
        assert_eq!(params.resolved_cipher_suite(), "AES/GCM/NoPadding");

        let params = params.with_cipher_suite("  ");
        assert_eq!(params.resolved_cipher_suite(), "AES/KWP/NoPadding");
    }

    #[test]
    fn unwrap_request_drops_the_plaintext() {
        let params = KeyEncryptionParams::new()
            .with_plaintext_key(vec![1u8; 16])
            .with_wrapped_key(vec![2u8; 24]);
        let request = params.to_unwrap_request();
        assert!(request.plaintext_key.is_none());
        assert_eq!(request.wrapped_key, Some(vec![2u8; 24]));
    }

    #[test]
    fn debug_output_redacts_the_plaintext() {
        let params = KeyEncryptionParams::new().with_plaintext_key(vec![0xabu8; 16]);
        let rendered = format!("{:?}", params);
        assert!(!rendered.contains("171"));
        assert_eq!(params.plaintext_key_bytes(), Some(&[0xabu8; 16][..]));
    }
}
