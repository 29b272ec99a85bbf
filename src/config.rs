//!
//! # 配置模块
//!
//! Option keys consumed by the key-encryption strategy, their defaults, and
//! resolution of the key-encryption key location.
//!
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Default descriptor for the wrap cipher suite (RFC 3394 AES key wrap).
pub const DEFAULT_KEY_STRATEGY_CIPHER_SUITE: &str = "AES/KW/NoPadding";
/// Default key-encryption key location, relative to the instance directory.
pub const DEFAULT_KEY_LOCATION: &str = "/crypto/secret/keyEncryptionKey";
/// Default instance root directory.
pub const DEFAULT_INSTANCE_DIR: &str = "/accumulo";
/// Default data key length in bits.
pub const DEFAULT_KEY_LENGTH_BITS: u32 = 128;
/// Default algorithm name the wrapped keys are tagged with.
pub const DEFAULT_ALGORITHM_NAME: &str = "AES";
/// Default random source name.
pub const DEFAULT_SECURE_RNG: &str = "OsRng";
/// Default random source provider.
pub const DEFAULT_SECURE_RNG_PROVIDER: &str = "rand_core";

/// A configuration option understood by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Cipher suite used to wrap data keys.
    KeyStrategyCipherSuite,
    /// Location of the key-encryption key below the instance directory.
    KeyStrategyKeyLocation,
    /// Instance root directory on the shared store.
    InstanceDfsDir,
    /// URI of the shared store.
    InstanceDfsUri,
    /// Data key length in bits.
    CipherKeyLength,
    /// Algorithm name of the data keys.
    CipherAlgorithmName,
    /// Random source name.
    SecureRng,
    /// Random source provider.
    SecureRngProvider,
}

impl Property {
    /// Every property, in documentation order.
    pub const ALL: [Property; 8] = [
        Property::KeyStrategyCipherSuite,
        Property::KeyStrategyKeyLocation,
        Property::InstanceDfsDir,
        Property::InstanceDfsUri,
        Property::CipherKeyLength,
        Property::CipherAlgorithmName,
        Property::SecureRng,
        Property::SecureRngProvider,
    ];

    /// The option key as it appears in an options map.
    pub fn key(&self) -> &'static str {
        match self {
            Property::KeyStrategyCipherSuite => "crypto.default.key.strategy.cipher.suite",
            Property::KeyStrategyKeyLocation => "crypto.default.key.strategy.key.location",
            Property::InstanceDfsDir => "instance.dfs.dir",
            Property::InstanceDfsUri => "instance.dfs.uri",
            Property::CipherKeyLength => "crypto.cipher.key.length",
            Property::CipherAlgorithmName => "crypto.cipher.algorithm.name",
            Property::SecureRng => "crypto.secure.rng",
            Property::SecureRngProvider => "crypto.secure.rng.provider",
        }
    }

    pub fn default_value(&self) -> &'static str {
        match self {
            Property::KeyStrategyCipherSuite => DEFAULT_KEY_STRATEGY_CIPHER_SUITE,
            Property::KeyStrategyKeyLocation => DEFAULT_KEY_LOCATION,
            Property::InstanceDfsDir => DEFAULT_INSTANCE_DIR,
            Property::InstanceDfsUri => "",
            Property::CipherKeyLength => "128",
            Property::CipherAlgorithmName => DEFAULT_ALGORITHM_NAME,
            Property::SecureRng => DEFAULT_SECURE_RNG,
            Property::SecureRngProvider => DEFAULT_SECURE_RNG_PROVIDER,
        }
    }

    /// Returns the configured value, treating blank values as absent.
    pub fn lookup<'a>(&self, options: &'a HashMap<String, String>) -> Option<&'a str> {
        options
            .get(self.key())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Returns the configured value or the default.
    pub fn resolve<'a>(&self, options: &'a HashMap<String, String>) -> &'a str {
        self.lookup(options).unwrap_or(self.default_value())
    }
}

fn default_cipher_suite() -> String {
    DEFAULT_KEY_STRATEGY_CIPHER_SUITE.to_string()
}

fn default_key_location() -> String {
    DEFAULT_KEY_LOCATION.to_string()
}

fn default_instance_dir() -> String {
    DEFAULT_INSTANCE_DIR.to_string()
}

/// Key strategy settings, resolved from an options map or loaded from JSON.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KeyStrategyConfig {
    /// Fallback wrap cipher suite when the parameter bag does not name one.
    #[serde(default = "default_cipher_suite")]
    pub cipher_suite: String,
    /// Key-encryption key location below `instance_dir`.
    #[serde(default = "default_key_location")]
    pub key_location: String,
    /// Instance root directory.
    #[serde(default = "default_instance_dir")]
    pub instance_dir: String,
    /// Storage URI; empty means the caller supplies the storage backend.
    #[serde(default)]
    pub storage_uri: String,
}

impl Default for KeyStrategyConfig {
    fn default() -> Self {
        Self {
            cipher_suite: default_cipher_suite(),
            key_location: default_key_location(),
            instance_dir: default_instance_dir(),
            storage_uri: String::new(),
        }
    }
}

impl KeyStrategyConfig {
    /// Resolves the settings from an options map, applying defaults for absent keys.
    pub fn from_options(options: &HashMap<String, String>) -> Self {
        Self {
            cipher_suite: Property::KeyStrategyCipherSuite.resolve(options).to_string(),
            key_location: Property::KeyStrategyKeyLocation.resolve(options).to_string(),
            instance_dir: Property::InstanceDfsDir.resolve(options).to_string(),
            storage_uri: Property::InstanceDfsUri.resolve(options).to_string(),
        }
    }

    /// Parses the settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("invalid key strategy config: {}", e)))
    }

    /// Renders the settings back into an options map.
    pub fn to_options(&self) -> HashMap<String, String> {
        let mut options = HashMap::new();
        options.insert(
            Property::KeyStrategyCipherSuite.key().to_string(),
            self.cipher_suite.clone(),
        );
        options.insert(
            Property::KeyStrategyKeyLocation.key().to_string(),
            self.key_location.clone(),
        );
        options.insert(
            Property::InstanceDfsDir.key().to_string(),
            self.instance_dir.clone(),
        );
        if !self.storage_uri.is_empty() {
            options.insert(
                Property::InstanceDfsUri.key().to_string(),
                self.storage_uri.clone(),
            );
        }
        options
    }

    /// Full path of the key-encryption key record: instance directory followed by the
    /// key location. The result always begins with `/`.
    pub fn kek_path(&self) -> Result<String> {
        let location = or_default(&self.key_location, DEFAULT_KEY_LOCATION);
        let root = or_default(&self.instance_dir, DEFAULT_INSTANCE_DIR);
        validate_path_component("key location", location)?;
        validate_path_component("instance directory", root)?;

        let root = root.trim_end_matches('/');
        let full = if location.starts_with('/') {
            format!("{}{}", root, location)
        } else {
            format!("{}/{}", root, location)
        };

        if full.starts_with('/') {
            Ok(full)
        } else {
            Ok(format!("/{}", full))
        }
    }
}

/// Resolves the key-encryption key path straight from an options map.
pub fn resolve_kek_path(options: &HashMap<String, String>) -> Result<String> {
    KeyStrategyConfig::from_options(options).kek_path()
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() { default } else { value }
}

fn validate_path_component(what: &str, value: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(Error::Configuration(format!(
            "{} contains a NUL byte",
            what
        )));
    }
    if value.split('/').any(|segment| segment == "..") {
        return Err(Error::Configuration(format!(
            "{} must not contain '..' segments: {}",
            what, value
        )));
    }
    Ok(())
}
