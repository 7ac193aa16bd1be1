#![forbid(unsafe_code)]

//! Block cipher algorithm implementations (AES-CBC, AES-GCM, 3DES-CBC).
//!
//! Every algorithm produces `iv || ciphertext` (nonce for GCM) so the
//! output is self-contained, matching the XML Encryption wire layout.

use solna_core::{algorithm, Error, Result};

/// Trait for cipher algorithms usable as an `EncryptionMethod`.
pub trait CipherAlgorithm: Send {
    fn uri(&self) -> &'static str;
    fn key_size(&self) -> usize;
    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;
    fn decrypt(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>>;
}

/// Create a cipher algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn CipherAlgorithm>> {
    match uri {
        algorithm::AES128_CBC => Ok(Box::new(AesCbc::new(algorithm::AES128_CBC, 16))),
        algorithm::AES192_CBC => Ok(Box::new(AesCbc::new(algorithm::AES192_CBC, 24))),
        algorithm::AES256_CBC => Ok(Box::new(AesCbc::new(algorithm::AES256_CBC, 32))),
        algorithm::AES128_GCM => Ok(Box::new(AesGcm::new(algorithm::AES128_GCM, 16))),
        algorithm::AES192_GCM => Ok(Box::new(AesGcm::new(algorithm::AES192_GCM, 24))),
        algorithm::AES256_GCM => Ok(Box::new(AesGcm::new(algorithm::AES256_GCM, 32))),
        algorithm::TRIPLEDES_CBC => Ok(Box::new(TripleDesCbc)),
        _ => Err(Error::UnsupportedAlgorithm(format!("cipher: {uri}"))),
    }
}

/// The key size in bytes an algorithm URI requires, if it names a cipher.
pub fn key_size_for_uri(uri: &str) -> Option<usize> {
    match uri {
        algorithm::AES128_CBC | algorithm::AES128_GCM => Some(16),
        algorithm::AES192_CBC | algorithm::AES192_GCM | algorithm::TRIPLEDES_CBC => Some(24),
        algorithm::AES256_CBC | algorithm::AES256_GCM => Some(32),
        _ => None,
    }
}

fn check_key_len(expected: usize, key: &[u8]) -> Result<()> {
    if key.len() != expected {
        return Err(Error::Crypto(format!(
            "expected {expected} byte key, got {}",
            key.len()
        )));
    }
    Ok(())
}

fn random_bytes<const N: usize>() -> [u8; N] {
    use rand::RngCore;
    let mut buf = [0u8; N];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

// ── CBC helpers ──────────────────────────────────────────────────────

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8], block: usize) -> Result<Vec<u8>>
where
    C: cbc::cipher::BlockEncryptMut + cbc::cipher::BlockCipher + cbc::cipher::KeyInit,
{
    use cbc::cipher::{BlockEncryptMut, KeyIvInit};

    let mut buf = pad_block(plaintext, block);
    let len = buf.len();
    let enc = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|e| Error::Crypto(format!("CBC init: {e}")))?;
    enc.encrypt_padded_mut::<cbc::cipher::block_padding::NoPadding>(&mut buf, len)
        .map_err(|e| Error::Crypto(format!("CBC encrypt: {e}")))?;

    let mut out = Vec::with_capacity(iv.len() + buf.len());
    out.extend_from_slice(iv);
    out.extend_from_slice(&buf);
    Ok(out)
}

fn cbc_decrypt<C>(key: &[u8], data: &[u8], block: usize) -> Result<Vec<u8>>
where
    C: cbc::cipher::BlockDecryptMut + cbc::cipher::BlockCipher + cbc::cipher::KeyInit,
{
    use cbc::cipher::{BlockDecryptMut, KeyIvInit};

    if data.len() < 2 * block || data.len() % block != 0 {
        return Err(Error::Crypto("CBC data has invalid length".into()));
    }
    let (iv, ciphertext) = data.split_at(block);
    let mut buf = ciphertext.to_vec();
    let dec = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|e| Error::Crypto(format!("CBC init: {e}")))?;
    dec.decrypt_padded_mut::<cbc::cipher::block_padding::NoPadding>(&mut buf)
        .map_err(|e| Error::Crypto(format!("CBC decrypt: {e}")))?;
    unpad_block(&buf, block)
}

/// PKCS#7-style padding to a whole number of blocks.
fn pad_block(data: &[u8], block: usize) -> Vec<u8> {
    let pad = block - (data.len() % block);
    let mut out = Vec::with_capacity(data.len() + pad);
    out.extend_from_slice(data);
    out.resize(data.len() + pad, pad as u8);
    out
}

/// Remove XML Encryption block padding.
///
/// Both the 1.0 PKCS#7 style and the 1.1 ISO 10126 style store the pad
/// length in the final byte; ISO 10126 fills the rest with random bytes,
/// so only the final byte is checked.  Accepts either scheme.
fn unpad_block(data: &[u8], block: usize) -> Result<Vec<u8>> {
    let pad = match data.last() {
        Some(&b) => b as usize,
        None => return Ok(Vec::new()),
    };
    if pad == 0 || pad > block || pad > data.len() {
        return Err(Error::Crypto("invalid padding".into()));
    }
    Ok(data[..data.len() - pad].to_vec())
}

// ── AES-CBC ──────────────────────────────────────────────────────────

struct AesCbc {
    uri: &'static str,
    key_size: usize,
}

impl AesCbc {
    fn new(uri: &'static str, key_size: usize) -> Self {
        Self { uri, key_size }
    }
}

impl CipherAlgorithm for AesCbc {
    fn uri(&self) -> &'static str {
        self.uri
    }
    fn key_size(&self) -> usize {
        self.key_size
    }

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        check_key_len(self.key_size, key)?;
        let iv = random_bytes::<16>();
        match self.key_size {
            16 => cbc_encrypt::<aes::Aes128>(key, &iv, plaintext, 16),
            24 => cbc_encrypt::<aes::Aes192>(key, &iv, plaintext, 16),
            32 => cbc_encrypt::<aes::Aes256>(key, &iv, plaintext, 16),
            _ => Err(Error::Crypto("unsupported AES key size".into())),
        }
    }

    fn decrypt(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        check_key_len(self.key_size, key)?;
        match self.key_size {
            16 => cbc_decrypt::<aes::Aes128>(key, data, 16),
            24 => cbc_decrypt::<aes::Aes192>(key, data, 16),
            32 => cbc_decrypt::<aes::Aes256>(key, data, 16),
            _ => Err(Error::Crypto("unsupported AES key size".into())),
        }
    }
}

// ── AES-GCM ──────────────────────────────────────────────────────────

struct AesGcm {
    uri: &'static str,
    key_size: usize,
}

impl AesGcm {
    fn new(uri: &'static str, key_size: usize) -> Self {
        Self { uri, key_size }
    }
}

impl CipherAlgorithm for AesGcm {
    fn uri(&self) -> &'static str {
        self.uri
    }
    fn key_size(&self) -> usize {
        self.key_size
    }

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        use aes_gcm::aead::consts::U12;
        use aes_gcm::{aead::Aead, KeyInit, Nonce};

        check_key_len(self.key_size, key)?;
        let nonce_bytes = random_bytes::<12>();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = match self.key_size {
            16 => aes_gcm::Aes128Gcm::new_from_slice(key)
                .map_err(|e| Error::Crypto(format!("AES-GCM init: {e}")))?
                .encrypt(nonce, plaintext),
            24 => aes_gcm::AesGcm::<aes::Aes192, U12>::new_from_slice(key)
                .map_err(|e| Error::Crypto(format!("AES-GCM init: {e}")))?
                .encrypt(nonce, plaintext),
            32 => aes_gcm::Aes256Gcm::new_from_slice(key)
                .map_err(|e| Error::Crypto(format!("AES-GCM init: {e}")))?
                .encrypt(nonce, plaintext),
            _ => return Err(Error::Crypto("unsupported AES key size".into())),
        }
        .map_err(|e| Error::Crypto(format!("AES-GCM encrypt: {e}")))?;

        let mut out = Vec::with_capacity(12 + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        use aes_gcm::aead::consts::U12;
        use aes_gcm::{aead::Aead, KeyInit, Nonce};

        check_key_len(self.key_size, key)?;
        if data.len() < 12 + 16 {
            return Err(Error::Crypto("AES-GCM data too short".into()));
        }
        let nonce = Nonce::from_slice(&data[..12]);
        let ct_and_tag = &data[12..];

        match self.key_size {
            16 => aes_gcm::Aes128Gcm::new_from_slice(key)
                .map_err(|e| Error::Crypto(format!("AES-GCM init: {e}")))?
                .decrypt(nonce, ct_and_tag),
            24 => aes_gcm::AesGcm::<aes::Aes192, U12>::new_from_slice(key)
                .map_err(|e| Error::Crypto(format!("AES-GCM init: {e}")))?
                .decrypt(nonce, ct_and_tag),
            32 => aes_gcm::Aes256Gcm::new_from_slice(key)
                .map_err(|e| Error::Crypto(format!("AES-GCM init: {e}")))?
                .decrypt(nonce, ct_and_tag),
            _ => return Err(Error::Crypto("unsupported AES key size".into())),
        }
        .map_err(|e| Error::Crypto(format!("AES-GCM decrypt: {e}")))
    }
}

// ── 3DES-CBC ─────────────────────────────────────────────────────────

struct TripleDesCbc;

impl CipherAlgorithm for TripleDesCbc {
    fn uri(&self) -> &'static str {
        algorithm::TRIPLEDES_CBC
    }
    fn key_size(&self) -> usize {
        24
    }

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        check_key_len(24, key)?;
        let iv = random_bytes::<8>();
        cbc_encrypt::<des::TdesEde3>(key, &iv, plaintext, 8)
    }

    fn decrypt(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        check_key_len(24, key)?;
        cbc_decrypt::<des::TdesEde3>(key, data, 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_unpad_roundtrip() {
        let padded = pad_block(b"hello", 16);
        assert_eq!(padded.len(), 16);
        assert_eq!(unpad_block(&padded, 16).unwrap(), b"hello");
    }

    #[test]
    fn iso10126_style_unpad() {
        // random filler bytes, only the final byte carries the length
        let mut data = b"hello world!".to_vec();
        data.extend_from_slice(&[0xAB, 0xCD, 0xEF, 0x04]);
        assert_eq!(unpad_block(&data, 16).unwrap(), b"hello world!");
    }

    #[test]
    fn block_aligned_input_grows_one_block() {
        let padded = pad_block(b"Exactly16bytes!!", 16);
        assert_eq!(padded.len(), 32);
        assert_eq!(unpad_block(&padded, 16).unwrap(), b"Exactly16bytes!!");
    }

    #[test]
    fn cbc_roundtrip_all_sizes() {
        let cases: &[(&str, usize)] = &[
            (algorithm::AES128_CBC, 16),
            (algorithm::AES192_CBC, 24),
            (algorithm::AES256_CBC, 32),
            (algorithm::TRIPLEDES_CBC, 24),
        ];
        let plaintexts: &[&[u8]] = &[
            b"A",
            b"hello world",
            b"Exactly16bytes!!",
            b"a longer message spanning several cipher blocks for good measure",
        ];
        for &(uri, key_size) in cases {
            let key: Vec<u8> = (0..key_size).map(|i| i as u8).collect();
            let cipher = from_uri(uri).unwrap();
            assert_eq!(cipher.key_size(), key_size);
            for &pt in plaintexts {
                let ct = cipher.encrypt(&key, pt).unwrap();
                assert_eq!(cipher.decrypt(&key, &ct).unwrap(), pt, "{uri}");
            }
        }
    }

    #[test]
    fn gcm_roundtrip_all_sizes() {
        let pt = b"Hello, World! This is a test message for AES-GCM encryption.";
        for &(uri, key_size) in &[
            (algorithm::AES128_GCM, 16usize),
            (algorithm::AES192_GCM, 24),
            (algorithm::AES256_GCM, 32),
        ] {
            let key: Vec<u8> = (0..key_size).map(|i| i as u8).collect();
            let cipher = from_uri(uri).unwrap();
            let ct = cipher.encrypt(&key, pt).unwrap();
            assert_eq!(cipher.decrypt(&key, &ct).unwrap(), pt, "{uri}");
        }
    }

    #[test]
    fn gcm_rejects_corrupted_tag() {
        let key = [0x42u8; 16];
        let cipher = from_uri(algorithm::AES128_GCM).unwrap();
        let mut ct = cipher.encrypt(&key, b"auth tag check").unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0xFF;
        assert!(cipher.decrypt(&key, &ct).is_err());
    }

    #[test]
    fn gcm_rejects_wrong_key() {
        let cipher = from_uri(algorithm::AES128_GCM).unwrap();
        let ct = cipher.encrypt(&[0x42u8; 16], b"sensitive data").unwrap();
        assert!(cipher.decrypt(&[0x99u8; 16], &ct).is_err());
    }

    #[test]
    fn w3c_uri_spellings() {
        assert_eq!(
            algorithm::AES128_CBC,
            "http://www.w3.org/2001/04/xmlenc#aes128-cbc"
        );
        assert_eq!(
            algorithm::AES256_GCM,
            "http://www.w3.org/2009/xmlenc11#aes256-gcm"
        );
        assert_eq!(
            algorithm::TRIPLEDES_CBC,
            "http://www.w3.org/2001/04/xmlenc#tripledes-cbc"
        );
    }

    #[test]
    fn unknown_uri_rejected() {
        assert!(from_uri("http://example.com/fake-cipher").is_err());
    }
}
