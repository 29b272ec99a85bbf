//! AES-GCM key wrapping (`AES/GCM/NoPadding`).
//!
//! Output layout: `[12-byte nonce][ciphertext][16-byte tag]`. The algorithm name is
//! bound as associated data, so unwrapping under a different algorithm name fails.
use aes_gcm::aead::{self, Aead, KeyInit, OsRng, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use zeroize::Zeroizing;

use super::KeyWrapCipher;
use crate::error::{Error, Result};

const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

/// AES-GCM key wrapping with a 128-bit or 256-bit key-encryption key.
#[derive(Debug, Default, Clone, Copy)]
pub struct AesGcmWrap;

fn seal<C: Aead + KeyInit>(kek: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = C::new_from_slice(kek)
        .map_err(|e| Error::WrapFailure(format!("failed to create cipher: {}", e)))?;
    let nonce = C::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, Payload { msg: plaintext, aad })
        .map_err(|e| Error::WrapFailure(format!("AES-GCM encryption failed: {}", e)))?;

    let mut wrapped = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    wrapped.extend_from_slice(nonce.as_slice());
    wrapped.extend_from_slice(&ciphertext);
    Ok(wrapped)
}

fn open<C: Aead + KeyInit>(kek: &[u8], aad: &[u8], wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = C::new_from_slice(kek)
        .map_err(|e| Error::UnwrapFailure(format!("failed to create cipher: {}", e)))?;
    let (nonce_slice, ciphertext) = wrapped.split_at(NONCE_SIZE);
    let nonce = aead::Nonce::<C>::from_slice(nonce_slice);

    cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad })
        .map(Zeroizing::new)
        .map_err(|_| {
            Error::UnwrapFailure(
                "AES-GCM authentication failed: wrong key, wrong algorithm name or tampered data"
                    .to_string(),
            )
        })
}

impl KeyWrapCipher for AesGcmWrap {
    fn descriptor(&self) -> &'static str {
        "AES/GCM/NoPadding"
    }

    fn family(&self) -> &'static str {
        "AES"
    }

    fn wrap(&self, kek: &[u8], algorithm_name: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        if plaintext.is_empty() {
            return Err(Error::WrapFailure("cannot wrap an empty key".to_string()));
        }
        let aad = algorithm_name.as_bytes();
        match kek.len() {
            16 => seal::<Aes128Gcm>(kek, aad, plaintext),
            32 => seal::<Aes256Gcm>(kek, aad, plaintext),
            n => Err(Error::WrapFailure(format!(
                "key encryption key must be 16 or 32 bytes for AES-GCM, got {}",
                n
            ))),
        }
    }

    fn unwrap(
        &self,
        kek: &[u8],
        algorithm_name: &str,
        wrapped: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        if wrapped.len() <= NONCE_SIZE + TAG_SIZE {
            return Err(Error::UnwrapFailure(
                "wrapped key is too short for AES-GCM".to_string(),
            ));
        }
        let aad = algorithm_name.as_bytes();
        match kek.len() {
            16 => open::<Aes128Gcm>(kek, aad, wrapped),
            32 => open::<Aes256Gcm>(kek, aad, wrapped),
            n => Err(Error::UnwrapFailure(format!(
                "key encryption key must be 16 or 32 bytes for AES-GCM, got {}",
                n
            ))),
        }
    }
}
