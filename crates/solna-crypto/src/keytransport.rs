#![forbid(unsafe_code)]

//! RSA key transport algorithms (PKCS#1 v1.5, RSA-OAEP).
//!
//! Used as an `EncryptionMethod` for small payloads (key material)
//! addressed to an RSA key.

use solna_core::{algorithm, Error, Result};

/// Parameters read from an RSA-OAEP `EncryptionMethod` element.
#[derive(Debug, Default, Clone)]
pub struct OaepParams {
    /// Digest algorithm URI from the `DigestMethod` child, if present.
    pub digest_uri: Option<String>,
    /// Decoded `OAEPparams` label bytes, if present.
    pub oaep_params: Option<Vec<u8>>,
}

/// Trait for key transport algorithms.
pub trait KeyTransportAlgorithm: Send {
    fn uri(&self) -> &'static str;
    fn encrypt(&self, public_key: &rsa::RsaPublicKey, data: &[u8]) -> Result<Vec<u8>>;
    fn decrypt(&self, private_key: &rsa::RsaPrivateKey, encrypted: &[u8]) -> Result<Vec<u8>>;
}

/// Create a key transport algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn KeyTransportAlgorithm>> {
    from_uri_with_params(uri, OaepParams::default())
}

/// Create a key transport algorithm from its URI with OAEP parameters.
pub fn from_uri_with_params(
    uri: &str,
    params: OaepParams,
) -> Result<Box<dyn KeyTransportAlgorithm>> {
    match uri {
        algorithm::RSA_PKCS1 => Ok(Box::new(RsaPkcs1Transport)),
        algorithm::RSA_OAEP => Ok(Box::new(RsaOaepTransport { params })),
        _ => Err(Error::UnsupportedAlgorithm(format!("key transport: {uri}"))),
    }
}

struct RsaPkcs1Transport;

impl KeyTransportAlgorithm for RsaPkcs1Transport {
    fn uri(&self) -> &'static str {
        algorithm::RSA_PKCS1
    }

    fn encrypt(&self, public_key: &rsa::RsaPublicKey, data: &[u8]) -> Result<Vec<u8>> {
        use rsa::Pkcs1v15Encrypt;
        let mut rng = rand::thread_rng();
        public_key
            .encrypt(&mut rng, Pkcs1v15Encrypt, data)
            .map_err(|e| Error::Crypto(format!("RSA PKCS#1 encrypt: {e}")))
    }

    fn decrypt(&self, private_key: &rsa::RsaPrivateKey, encrypted: &[u8]) -> Result<Vec<u8>> {
        use rsa::Pkcs1v15Encrypt;
        private_key
            .decrypt(Pkcs1v15Encrypt, encrypted)
            .map_err(|e| Error::Crypto(format!("RSA PKCS#1 decrypt: {e}")))
    }
}

struct RsaOaepTransport {
    params: OaepParams,
}

impl RsaOaepTransport {
    /// Build the OAEP padding from the parsed parameters.
    ///
    /// The default digest for `rsa-oaep-mgf1p` is SHA-1; a `DigestMethod`
    /// child may select SHA-256 instead.
    fn padding(&self) -> Result<rsa::Oaep> {
        let mut padding = match self.params.digest_uri.as_deref() {
            None | Some(algorithm::SHA1) => rsa::Oaep::new::<sha1::Sha1>(),
            Some(algorithm::SHA256) => rsa::Oaep::new::<sha2::Sha256>(),
            Some(other) => {
                return Err(Error::UnsupportedAlgorithm(format!(
                    "RSA-OAEP digest: {other}"
                )))
            }
        };
        padding.label = self
            .params
            .oaep_params
            .as_ref()
            .map(|label| String::from_utf8_lossy(label).into_owned());
        Ok(padding)
    }
}

impl KeyTransportAlgorithm for RsaOaepTransport {
    fn uri(&self) -> &'static str {
        algorithm::RSA_OAEP
    }

    fn encrypt(&self, public_key: &rsa::RsaPublicKey, data: &[u8]) -> Result<Vec<u8>> {
        let mut rng = rand::thread_rng();
        public_key
            .encrypt(&mut rng, self.padding()?, data)
            .map_err(|e| Error::Crypto(format!("RSA-OAEP encrypt: {e}")))
    }

    fn decrypt(&self, private_key: &rsa::RsaPrivateKey, encrypted: &[u8]) -> Result<Vec<u8>> {
        private_key
            .decrypt(self.padding()?, encrypted)
            .map_err(|e| Error::Crypto(format!("RSA-OAEP decrypt: {e}")))
    }
}
