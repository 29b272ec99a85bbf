//! The envelope strategy: wraps and unwraps data keys under a single locally stored
//! key-encryption key.
// 中文: 信封加密策略，使用本地存储的单个密钥加密密钥包装与解包数据密钥。

use log::{debug, error};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{Property, resolve_kek_path};
use crate::error::{Error, Result};
use crate::kek_store::{KekStore, key_length_bytes};
use crate::params::KeyEncryptionParams;
use crate::random::RngRegistry;
use crate::storage::{KeyStorage, open_storage};
use crate::wrap::{CipherSuiteRegistry, WrapExecutor};

/// Encrypts and decrypts data keys carried in a [`KeyEncryptionParams`] bag.
///
/// Both operations take the bag mutably and hand it back on success. On failure the bag
/// is left untouched, including any plaintext key it already held. Unwrap requests should
/// start from a bag without a plaintext key, e.g. one built by
/// [`KeyEncryptionParams::to_unwrap_request`].
pub trait SecretKeyEncryptionStrategy: Send + Sync {
    /// Wraps `params.plaintext_key`, filling `wrapped_key` and `key_encryption_key_id`.
    fn encrypt_secret_key<'p>(
        &self,
        params: &'p mut KeyEncryptionParams,
    ) -> Result<&'p mut KeyEncryptionParams>;

    /// Unwraps `params.wrapped_key`, filling `plaintext_key`.
    fn decrypt_secret_key<'p>(
        &self,
        params: &'p mut KeyEncryptionParams,
    ) -> Result<&'p mut KeyEncryptionParams>;
}

/// A [`SecretKeyEncryptionStrategy`] keeping one key-encryption key per deployment at
/// `<instance dir>/<key location>` on a [`KeyStorage`].
///
/// The key-encryption key is created on the first encrypt and never on decrypt. It is
/// read again on every call, so a record replaced out of band is picked up right away.
/// The strategy holds no per-call state and can be shared between threads.
#[derive(Clone)]
pub struct LocalKeyEncryptionStrategy {
    kek_store: KekStore,
    executor: WrapExecutor,
    rngs: RngRegistry,
}

impl LocalKeyEncryptionStrategy {
    pub fn new(
        storage: Arc<dyn KeyStorage>,
        suites: CipherSuiteRegistry,
        rngs: RngRegistry,
    ) -> Self {
        Self {
            kek_store: KekStore::new(storage),
            executor: WrapExecutor::new(suites),
            rngs,
        }
    }

    /// A strategy over `storage` with every built-in cipher suite and random source.
    pub fn with_storage(storage: Arc<dyn KeyStorage>) -> Self {
        Self::new(storage, CipherSuiteRegistry::default(), RngRegistry::default())
    }

    /// A strategy over the storage named by `uri`, see [`open_storage`].
    pub fn from_uri(uri: &str) -> Result<Self> {
        Ok(Self::with_storage(open_storage(uri)?))
    }

    /// A strategy over the storage named by the `instance.dfs.uri` option.
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self> {
        Self::from_uri(Property::InstanceDfsUri.resolve(options))
    }

    pub fn kek_store(&self) -> &KekStore {
        &self.kek_store
    }

    /// Path of the key-encryption key record these parameters point at.
    pub fn kek_path(&self, params: &KeyEncryptionParams) -> Result<String> {
        resolve_kek_path(&params.options)
    }

    fn provision(&self, path: &str, params: &KeyEncryptionParams) -> Result<()> {
        if self.kek_store.exists(path)? {
            return Ok(());
        }
        let rng = self.rngs.resolve(
            &params.random_number_generator,
            &params.random_number_generator_provider,
        )?;
        self.kek_store
            .ensure_exists(path, params.key_length_bits, &*rng)?;
        Ok(())
    }
}

impl SecretKeyEncryptionStrategy for LocalKeyEncryptionStrategy {
    fn encrypt_secret_key<'p>(
        &self,
        params: &'p mut KeyEncryptionParams,
    ) -> Result<&'p mut KeyEncryptionParams> {
        let path = self.kek_path(params)?;
        let plaintext = params
            .plaintext_key_bytes()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::InvalidParameters("no plaintext key to encrypt".to_string())
            })?;
        key_length_bytes(params.key_length_bits)?;
        let cipher_suite = params.resolved_cipher_suite();
        // 在创建密钥之前先确认套件可用
        self.executor
            .validate_wrap(&params.algorithm_name, cipher_suite)?;

        self.provision(&path, params)?;
        let kek = self.kek_store.load(&path)?;
        let wrapped = self
            .executor
            .wrap(plaintext, &params.algorithm_name, cipher_suite, &kek)?;

        debug!("wrapped {} key under key encryption key {}", params.algorithm_name, path);
        params.wrapped_key = Some(wrapped);
        params.key_encryption_key_id = Some(path);
        Ok(params)
    }

    fn decrypt_secret_key<'p>(
        &self,
        params: &'p mut KeyEncryptionParams,
    ) -> Result<&'p mut KeyEncryptionParams> {
        let path = self.kek_path(params)?;
        let wrapped = params
            .wrapped_key
            .as_deref()
            .filter(|w| !w.is_empty())
            .ok_or_else(|| Error::InvalidParameters("no wrapped key to decrypt".to_string()))?;
        let cipher_suite = params.resolved_cipher_suite();

        if !self.kek_store.exists(&path)? {
            error!(
                "key encryption key does not exist at {}. Either restore it, reconfigure \
                 the options to point to it, or discard the affected data",
                path
            );
            return Err(Error::KeyEncryptionKeyMissing { path });
        }

        let kek = self.kek_store.load(&path)?;
        let plaintext = self
            .executor
            .unwrap(wrapped, &params.algorithm_name, cipher_suite, &kek)?;

        debug!("unwrapped {} key with key encryption key {}", params.algorithm_name, path);
        params.set_plaintext_key(&plaintext);
        Ok(params)
    }
}
