#![forbid(unsafe_code)]

//! Key types and data structures.

/// Usage flags for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUsage {
    Encrypt,
    Decrypt,
    Any,
}

/// Where a key came from.  Preserved verbatim when a key is cloned, so
/// callers can tell statically-configured keys from keys located
/// through `KeyInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Supplied directly by the caller.
    Static,
    /// Located by `KeyName` from a `KeyInfo` element.
    KeyName,
    /// Picked by the key manager without `KeyInfo` guidance.
    KeyManager,
}

/// The broad kind of key an algorithm needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Aes,
    Des3,
    Rsa,
}

/// The underlying key data.
#[derive(Clone)]
pub enum KeyData {
    Aes(Vec<u8>),
    Des3(Vec<u8>),
    Rsa {
        private: Option<rsa::RsaPrivateKey>,
        public: rsa::RsaPublicKey,
    },
}

impl std::fmt::Debug for KeyData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aes(k) => write!(f, "AES key ({} bytes)", k.len()),
            Self::Des3(_) => write!(f, "3DES key"),
            Self::Rsa { private, .. } => {
                if private.is_some() {
                    write!(f, "RSA private+public key")
                } else {
                    write!(f, "RSA public key")
                }
            }
        }
    }
}

/// A named key with associated data and origin provenance.
#[derive(Debug, Clone)]
pub struct Key {
    /// Optional name for `KeyName` lookup.
    pub name: Option<String>,
    /// The key data.
    pub data: KeyData,
    /// The intended usage.
    pub usage: KeyUsage,
    /// Provenance, kept across clones.
    pub origin: KeyOrigin,
}

impl Key {
    /// Create a new key with [`KeyOrigin::Static`].
    pub fn new(data: KeyData, usage: KeyUsage) -> Self {
        Self {
            name: None,
            data,
            usage,
            origin: KeyOrigin::Static,
        }
    }

    /// Set the key name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the origin.
    pub fn with_origin(mut self, origin: KeyOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// The broad kind of this key.
    pub fn kind(&self) -> KeyKind {
        match &self.data {
            KeyData::Aes(_) => KeyKind::Aes,
            KeyData::Des3(_) => KeyKind::Des3,
            KeyData::Rsa { .. } => KeyKind::Rsa,
        }
    }

    /// Get the raw symmetric key bytes (AES, 3DES).
    pub fn symmetric_key_bytes(&self) -> Option<&[u8]> {
        match &self.data {
            KeyData::Aes(k) | KeyData::Des3(k) => Some(k),
            _ => None,
        }
    }

    /// Get the RSA public key if available.
    pub fn rsa_public_key(&self) -> Option<&rsa::RsaPublicKey> {
        match &self.data {
            KeyData::Rsa { public, .. } => Some(public),
            _ => None,
        }
    }

    /// Get the RSA private key if available.
    pub fn rsa_private_key(&self) -> Option<&rsa::RsaPrivateKey> {
        match &self.data {
            KeyData::Rsa {
                private: Some(pk), ..
            } => Some(pk),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_preserves_origin() {
        let key = Key::new(KeyData::Aes(vec![0u8; 16]), KeyUsage::Any)
            .with_name("k1")
            .with_origin(KeyOrigin::KeyName);
        let copy = key.clone();
        assert_eq!(copy.origin, KeyOrigin::KeyName);
        assert_eq!(copy.name.as_deref(), Some("k1"));
    }

    #[test]
    fn kind_matches_data() {
        assert_eq!(
            Key::new(KeyData::Des3(vec![0u8; 24]), KeyUsage::Any).kind(),
            KeyKind::Des3
        );
    }
}
