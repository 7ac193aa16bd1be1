#![forbid(unsafe_code)]

//! Key loading from PEM and raw binary formats.

use crate::key::{Key, KeyData, KeyUsage};
use solna_core::{Error, Result};

/// Load an RSA private key from PEM data (PKCS#8 or PKCS#1).
pub fn load_rsa_private_pem(pem_data: &[u8]) -> Result<Key> {
    use rsa::pkcs1::DecodeRsaPrivateKey;
    use rsa::pkcs8::DecodePrivateKey;

    let pem = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Key(format!("invalid PEM encoding: {e}")))?;

    let private = rsa::RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| rsa::RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| Error::Key(format!("failed to parse RSA private key PEM: {e}")))?;
    let public = private.to_public_key();
    Ok(Key::new(
        KeyData::Rsa {
            private: Some(private),
            public,
        },
        KeyUsage::Any,
    ))
}

/// Load an RSA public key from PEM data (SPKI or PKCS#1).
pub fn load_rsa_public_pem(pem_data: &[u8]) -> Result<Key> {
    use rsa::pkcs1::DecodeRsaPublicKey;
    use rsa::pkcs8::DecodePublicKey;

    let pem = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Key(format!("invalid PEM encoding: {e}")))?;

    let public = rsa::RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| rsa::RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| Error::Key(format!("failed to parse RSA public key PEM: {e}")))?;
    Ok(Key::new(
        KeyData::Rsa {
            private: None,
            public,
        },
        KeyUsage::Encrypt,
    ))
}

/// Load a raw AES key; the byte length must be 16, 24 or 32.
pub fn load_aes(bytes: &[u8]) -> Result<Key> {
    match bytes.len() {
        16 | 24 | 32 => Ok(Key::new(KeyData::Aes(bytes.to_vec()), KeyUsage::Any)),
        n => Err(Error::Key(format!("AES key must be 16/24/32 bytes, got {n}"))),
    }
}

/// Load a raw 3DES key (24 bytes).
pub fn load_des3(bytes: &[u8]) -> Result<Key> {
    if bytes.len() != 24 {
        return Err(Error::Key(format!(
            "3DES key must be 24 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(Key::new(KeyData::Des3(bytes.to_vec()), KeyUsage::Any))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes_sizes_enforced() {
        assert!(load_aes(&[0u8; 16]).is_ok());
        assert!(load_aes(&[0u8; 24]).is_ok());
        assert!(load_aes(&[0u8; 32]).is_ok());
        assert!(load_aes(&[0u8; 20]).is_err());
    }

    #[test]
    fn des3_size_enforced() {
        assert!(load_des3(&[0u8; 24]).is_ok());
        assert!(load_des3(&[0u8; 16]).is_err());
    }
}
