#![forbid(unsafe_code)]

//! Keyed transforms wrapping the cipher and key transport algorithms.
//!
//! Block ciphers are one-shot under the hood, so these transforms
//! buffer their input and run the primitive at the flush barrier.

use crate::transform::{Mode, Transform};
use solna_core::{algorithm, Error, Result};
use solna_crypto::cipher::CipherAlgorithm;
use solna_crypto::keytransport::KeyTransportAlgorithm;
use solna_keys::{Key, KeyKind, KeyRequest, KeyUsage};

fn usage_for(mode: Mode) -> KeyUsage {
    match mode {
        Mode::Encrypt => KeyUsage::Encrypt,
        Mode::Decrypt => KeyUsage::Decrypt,
    }
}

/// A block cipher as a pipeline transform.
pub struct CipherTransform {
    alg: Box<dyn CipherAlgorithm>,
    mode: Mode,
    key: Option<Vec<u8>>,
    data: Vec<u8>,
}

impl CipherTransform {
    pub fn new(alg: Box<dyn CipherAlgorithm>) -> Self {
        Self {
            alg,
            mode: Mode::Decrypt,
            key: None,
            data: Vec::new(),
        }
    }

    fn key_kind(&self) -> KeyKind {
        if self.alg.uri() == algorithm::TRIPLEDES_CBC {
            KeyKind::Des3
        } else {
            KeyKind::Aes
        }
    }
}

impl Transform for CipherTransform {
    fn uri(&self) -> &str {
        self.alg.uri()
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn key_request(&self, mode: Mode) -> Option<KeyRequest> {
        Some(KeyRequest {
            kind: self.key_kind(),
            usage: usage_for(mode),
        })
    }

    fn set_key(&mut self, key: &Key) -> Result<()> {
        let bytes = key
            .symmetric_key_bytes()
            .ok_or_else(|| Error::Key(format!("{} needs a symmetric key", self.alg.uri())))?;
        let wanted = self.alg.key_size();
        if bytes.len() < wanted {
            return Err(Error::Key(format!(
                "{} needs a {wanted} byte key, got {}",
                self.alg.uri(),
                bytes.len()
            )));
        }
        // a longer key is truncated to the method's size
        self.key = Some(bytes[..wanted].to_vec());
        Ok(())
    }

    fn update(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.data.extend_from_slice(input);
        Ok(Vec::new())
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let key = self
            .key
            .as_deref()
            .ok_or_else(|| Error::Key(format!("{} has no key", self.alg.uri())))?;
        let data = std::mem::take(&mut self.data);
        let out = match self.mode {
            Mode::Encrypt => self.alg.encrypt(key, &data),
            Mode::Decrypt => self.alg.decrypt(key, &data),
        };
        out.map_err(|e| Error::Transform(format!("{}: {e}", self.alg.uri())))
    }
}

/// RSA key transport as a pipeline transform.
pub struct KeyTransportTransform {
    alg: Box<dyn KeyTransportAlgorithm>,
    mode: Mode,
    key: Option<Key>,
    data: Vec<u8>,
}

impl KeyTransportTransform {
    pub fn new(alg: Box<dyn KeyTransportAlgorithm>) -> Self {
        Self {
            alg,
            mode: Mode::Decrypt,
            key: None,
            data: Vec::new(),
        }
    }
}

impl Transform for KeyTransportTransform {
    fn uri(&self) -> &str {
        self.alg.uri()
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn key_request(&self, mode: Mode) -> Option<KeyRequest> {
        Some(KeyRequest {
            kind: KeyKind::Rsa,
            usage: usage_for(mode),
        })
    }

    fn set_key(&mut self, key: &Key) -> Result<()> {
        if key.rsa_public_key().is_none() {
            return Err(Error::Key(format!("{} needs an RSA key", self.alg.uri())));
        }
        self.key = Some(key.clone());
        Ok(())
    }

    fn update(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.data.extend_from_slice(input);
        Ok(Vec::new())
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| Error::Key(format!("{} has no key", self.alg.uri())))?;
        let data = std::mem::take(&mut self.data);
        let out = match self.mode {
            Mode::Encrypt => {
                let public = key
                    .rsa_public_key()
                    .ok_or_else(|| Error::Key("RSA public key required".into()))?;
                self.alg.encrypt(public, &data)
            }
            Mode::Decrypt => {
                let private = key
                    .rsa_private_key()
                    .ok_or_else(|| Error::Key("RSA private key required".into()))?;
                self.alg.decrypt(private, &data)
            }
        };
        out.map_err(|e| Error::Transform(format!("{}: {e}", self.alg.uri())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solna_keys::KeyData;

    fn aes_key(bytes: Vec<u8>) -> Key {
        Key::new(KeyData::Aes(bytes), KeyUsage::Any)
    }

    #[test]
    fn cipher_roundtrip_through_transform() {
        let key = aes_key(vec![0u8; 16]);

        let mut enc = CipherTransform::new(
            solna_crypto::cipher::from_uri(algorithm::AES128_CBC).unwrap(),
        );
        enc.set_mode(Mode::Encrypt);
        enc.set_key(&key).unwrap();
        enc.update(b"hello ").unwrap();
        enc.update(b"world").unwrap();
        let ciphertext = enc.finish().unwrap();
        assert_ne!(ciphertext, b"hello world");

        let mut dec = CipherTransform::new(
            solna_crypto::cipher::from_uri(algorithm::AES128_CBC).unwrap(),
        );
        dec.set_mode(Mode::Decrypt);
        dec.set_key(&key).unwrap();
        dec.update(&ciphertext).unwrap();
        assert_eq!(dec.finish().unwrap(), b"hello world");
    }

    #[test]
    fn longer_key_is_truncated() {
        let mut t = CipherTransform::new(
            solna_crypto::cipher::from_uri(algorithm::AES128_CBC).unwrap(),
        );
        t.set_key(&aes_key(vec![7u8; 32])).unwrap();
        assert_eq!(t.key.as_deref().unwrap().len(), 16);
    }

    #[test]
    fn short_key_rejected() {
        let mut t = CipherTransform::new(
            solna_crypto::cipher::from_uri(algorithm::AES256_CBC).unwrap(),
        );
        assert!(t.set_key(&aes_key(vec![7u8; 16])).is_err());
    }

    #[test]
    fn wrong_key_is_a_transform_failure() {
        let mut enc = CipherTransform::new(
            solna_crypto::cipher::from_uri(algorithm::AES128_CBC).unwrap(),
        );
        enc.set_mode(Mode::Encrypt);
        enc.set_key(&aes_key(vec![0u8; 16])).unwrap();
        enc.update(b"hello world").unwrap();
        let ciphertext = enc.finish().unwrap();

        let mut dec = CipherTransform::new(
            solna_crypto::cipher::from_uri(algorithm::AES128_CBC).unwrap(),
        );
        dec.set_mode(Mode::Decrypt);
        dec.set_key(&aes_key(vec![1u8; 16])).unwrap();
        dec.update(&ciphertext).unwrap();
        // padding check fails under the wrong key (or yields garbage that
        // unpads; CBC gives no integrity, so only the error kind is fixed)
        if let Err(err) = dec.finish() {
            assert!(matches!(err, Error::Transform(_)));
        }
    }

    #[test]
    fn key_request_tracks_mode_and_kind() {
        let t = CipherTransform::new(
            solna_crypto::cipher::from_uri(algorithm::TRIPLEDES_CBC).unwrap(),
        );
        let req = t.key_request(Mode::Decrypt).unwrap();
        assert_eq!(req.kind, KeyKind::Des3);
        assert_eq!(req.usage, KeyUsage::Decrypt);
    }
}
