//! AES key wrap, RFC 3394 (`AES/KW/NoPadding`) and RFC 5649 (`AES/KWP/NoPadding`).
//!
//! Both modes carry an integrity check value, so a wrong key-encryption key or a
//! tampered wrapped key fails to unwrap instead of producing garbage.

use aes_kw::{KekAes128, KekAes192, KekAes256};
use zeroize::Zeroizing;

use super::KeyWrapCipher;
use crate::error::{Error, Result};

const SEMIBLOCK_SIZE: usize = 8;
const IV_LEN: usize = 8;

/// A key-encryption key sized for one of the AES variants.
enum SizedKek {
    Aes128(KekAes128),
    Aes192(KekAes192),
    Aes256(KekAes256),
}

impl SizedKek {
    fn new(kek: &[u8]) -> std::result::Result<Self, String> {
        let invalid = || {
            format!(
                "key encryption key must be 16, 24 or 32 bytes for AES key wrap, got {}",
                kek.len()
            )
        };
        match kek.len() {
            16 => {
                let bytes: [u8; 16] = kek.try_into().map_err(|_| invalid())?;
                Ok(SizedKek::Aes128(KekAes128::from(bytes)))
            }
            24 => {
                let bytes: [u8; 24] = kek.try_into().map_err(|_| invalid())?;
                Ok(SizedKek::Aes192(KekAes192::from(bytes)))
            }
            32 => {
                let bytes: [u8; 32] = kek.try_into().map_err(|_| invalid())?;
                Ok(SizedKek::Aes256(KekAes256::from(bytes)))
            }
            _ => Err(invalid()),
        }
    }

    fn wrap(&self, data: &[u8], out: &mut [u8]) -> std::result::Result<(), aes_kw::Error> {
        match self {
            SizedKek::Aes128(k) => k.wrap(data, out),
            SizedKek::Aes192(k) => k.wrap(data, out),
            SizedKek::Aes256(k) => k.wrap(data, out),
        }
    }

    fn unwrap(&self, data: &[u8], out: &mut [u8]) -> std::result::Result<(), aes_kw::Error> {
        match self {
            SizedKek::Aes128(k) => k.unwrap(data, out),
            SizedKek::Aes192(k) => k.unwrap(data, out),
            SizedKek::Aes256(k) => k.unwrap(data, out),
        }
    }

    fn wrap_with_padding(
        &self,
        data: &[u8],
        out: &mut [u8],
    ) -> std::result::Result<(), aes_kw::Error> {
        match self {
            SizedKek::Aes128(k) => k.wrap_with_padding(data, out),
            SizedKek::Aes192(k) => k.wrap_with_padding(data, out),
            SizedKek::Aes256(k) => k.wrap_with_padding(data, out),
        }
    }

    fn unwrap_with_padding<'a>(
        &self,
        data: &[u8],
        out: &'a mut [u8],
    ) -> std::result::Result<&'a [u8], aes_kw::Error> {
        match self {
            SizedKek::Aes128(k) => k.unwrap_with_padding(data, out),
            SizedKek::Aes192(k) => k.unwrap_with_padding(data, out),
            SizedKek::Aes256(k) => k.unwrap_with_padding(data, out),
        }
    }
}

/// RFC 3394 AES key wrap. Keys to wrap must be at least 16 bytes and a multiple of 8.
#[derive(Debug, Default, Clone, Copy)]
pub struct AesKeyWrap;

impl KeyWrapCipher for AesKeyWrap {
    fn descriptor(&self) -> &'static str {
        "AES/KW/NoPadding"
    }

    fn family(&self) -> &'static str {
        "AES"
    }

    fn wrap(&self, kek: &[u8], _algorithm_name: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        if plaintext.len() < 2 * SEMIBLOCK_SIZE || plaintext.len() % SEMIBLOCK_SIZE != 0 {
            return Err(Error::WrapFailure(format!(
                "{} needs a key of at least 16 bytes in whole 8-byte blocks, got {} bytes",
                self.descriptor(),
                plaintext.len()
            )));
        }
        let kek = SizedKek::new(kek).map_err(Error::WrapFailure)?;

        let mut wrapped = vec![0u8; plaintext.len() + IV_LEN];
        kek.wrap(plaintext, &mut wrapped)
            .map_err(|e| Error::WrapFailure(format!("AES key wrap failed: {:?}", e)))?;
        Ok(wrapped)
    }

    fn unwrap(
        &self,
        kek: &[u8],
        _algorithm_name: &str,
        wrapped: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        if wrapped.len() < 3 * SEMIBLOCK_SIZE || wrapped.len() % SEMIBLOCK_SIZE != 0 {
            return Err(Error::UnwrapFailure(format!(
                "wrapped key of {} bytes is not valid {} output",
                wrapped.len(),
                self.descriptor()
            )));
        }
        let kek = SizedKek::new(kek).map_err(Error::UnwrapFailure)?;

        let mut plaintext = Zeroizing::new(vec![0u8; wrapped.len() - IV_LEN]);
        kek.unwrap(wrapped, &mut plaintext)
            .map_err(|e| Error::UnwrapFailure(format!("AES key unwrap failed: {:?}", e)))?;
        Ok(plaintext)
    }
}

/// RFC 5649 AES key wrap with padding. Accepts any non-empty key.
#[derive(Debug, Default, Clone, Copy)]
pub struct AesKeyWrapPadded;

impl KeyWrapCipher for AesKeyWrapPadded {
    fn descriptor(&self) -> &'static str {
        "AES/KWP/NoPadding"
    }

    fn family(&self) -> &'static str {
        "AES"
    }

    fn wrap(&self, kek: &[u8], _algorithm_name: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        if plaintext.is_empty() {
            return Err(Error::WrapFailure("cannot wrap an empty key".to_string()));
        }
        let kek = SizedKek::new(kek).map_err(Error::WrapFailure)?;

        let padded_len = plaintext.len().div_ceil(SEMIBLOCK_SIZE) * SEMIBLOCK_SIZE;
        let mut wrapped = vec![0u8; padded_len + IV_LEN];
        kek.wrap_with_padding(plaintext, &mut wrapped)
            .map_err(|e| Error::WrapFailure(format!("AES key wrap failed: {:?}", e)))?;
        Ok(wrapped)
    }

    fn unwrap(
        &self,
        kek: &[u8],
        _algorithm_name: &str,
        wrapped: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        if wrapped.len() < 2 * SEMIBLOCK_SIZE || wrapped.len() % SEMIBLOCK_SIZE != 0 {
            return Err(Error::UnwrapFailure(format!(
                "wrapped key of {} bytes is not valid {} output",
                wrapped.len(),
                self.descriptor()
            )));
        }
        let kek = SizedKek::new(kek).map_err(Error::UnwrapFailure)?;

        let mut plaintext = Zeroizing::new(vec![0u8; wrapped.len() - IV_LEN]);
        let len = kek
            .unwrap_with_padding(wrapped, &mut plaintext)
            .map_err(|e| Error::UnwrapFailure(format!("AES key unwrap failed: {:?}", e)))?
            .len();
        plaintext.truncate(len);
        Ok(plaintext)
    }
}
