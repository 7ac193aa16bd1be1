#![forbid(unsafe_code)]

//! Key manager with named key store and the key resolution seam.

use crate::key::{Key, KeyKind, KeyOrigin, KeyUsage};
use crate::keyinfo;
use solna_core::{Error, Result};

/// What the engine needs from a key, stated explicitly at resolution
/// time: the kind the encryption method consumes and the direction it
/// will be used in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRequest {
    pub kind: KeyKind,
    pub usage: KeyUsage,
}

/// The key resolution callback.
///
/// `key_info` is the `<dsig:KeyInfo>` element from the `EncryptedData`
/// being processed, when one exists.  Returning `None` makes the
/// engine fail the call with `KeyNotFound`.
pub trait KeyResolver: Send + Sync {
    fn resolve(&self, key_info: Option<roxmltree::Node<'_, '_>>, request: &KeyRequest)
        -> Option<Key>;
}

/// Manages a collection of keys for lookup during encryption processing.
pub struct KeysManager {
    keys: Vec<Key>,
}

impl KeysManager {
    /// Create an empty keys manager.
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Add a key to the manager.
    pub fn add_key(&mut self, key: Key) {
        self.keys.push(key);
    }

    /// Find a key by name.
    pub fn find_by_name(&self, name: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.name.as_deref() == Some(name))
    }

    /// Find the first key of the given kind.
    pub fn find_by_kind(&self, kind: KeyKind) -> Option<&Key> {
        self.keys.iter().find(|k| k.kind() == kind)
    }

    /// Find an AES key with the specified byte length.
    pub fn find_aes_by_size(&self, size_bytes: usize) -> Option<&Key> {
        self.keys.iter().find(|k| {
            matches!(&k.data, crate::key::KeyData::Aes(bytes) if bytes.len() == size_bytes)
        })
    }

    /// Get the first key available (for simple single-key scenarios).
    pub fn first_key(&self) -> Result<&Key> {
        self.keys
            .first()
            .ok_or_else(|| Error::KeyNotFound("no keys in manager".into()))
    }

    /// Iterator over all keys.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for KeysManager {
    fn default() -> Self {
        Self::new()
    }
}

fn usable(key: &Key, request: &KeyRequest) -> bool {
    if key.kind() != request.kind {
        return false;
    }
    if !matches!(key.usage, KeyUsage::Any) && key.usage != request.usage {
        return false;
    }
    // RSA decryption needs the private half
    if request.kind == KeyKind::Rsa
        && request.usage == KeyUsage::Decrypt
        && key.rsa_private_key().is_none()
    {
        return false;
    }
    true
}

impl KeyResolver for KeysManager {
    fn resolve(
        &self,
        key_info: Option<roxmltree::Node<'_, '_>>,
        request: &KeyRequest,
    ) -> Option<Key> {
        // KeyName lookup first
        if let Some(name) = key_info.and_then(keyinfo::read_key_name) {
            if let Some(key) = self.find_by_name(&name) {
                if usable(key, request) {
                    return Some(key.clone().with_origin(KeyOrigin::KeyName));
                }
            }
        }
        // Fall back to the first usable key of the requested kind
        self.keys
            .iter()
            .find(|k| usable(k, request))
            .map(|k| k.clone().with_origin(KeyOrigin::KeyManager))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyData;

    fn aes(name: &str, byte: u8) -> Key {
        Key::new(KeyData::Aes(vec![byte; 16]), KeyUsage::Any).with_name(name)
    }

    #[test]
    fn resolve_by_key_name() {
        let mut mgr = KeysManager::new();
        mgr.add_key(aes("first", 1));
        mgr.add_key(aes("second", 2));

        let xml = r#"<KeyInfo xmlns="http://www.w3.org/2000/09/xmldsig#"><KeyName>second</KeyName></KeyInfo>"#;
        let doc = solna_xml::parse(xml).unwrap();
        let request = KeyRequest {
            kind: KeyKind::Aes,
            usage: KeyUsage::Decrypt,
        };
        let key = mgr.resolve(Some(doc.root_element()), &request).unwrap();
        assert_eq!(key.name.as_deref(), Some("second"));
        assert_eq!(key.origin, KeyOrigin::KeyName);
        assert_eq!(key.symmetric_key_bytes().unwrap(), &[2u8; 16]);
    }

    #[test]
    fn resolve_falls_back_to_kind() {
        let mut mgr = KeysManager::new();
        mgr.add_key(aes("only", 7));
        let request = KeyRequest {
            kind: KeyKind::Aes,
            usage: KeyUsage::Encrypt,
        };
        let key = mgr.resolve(None, &request).unwrap();
        assert_eq!(key.origin, KeyOrigin::KeyManager);
    }

    #[test]
    fn resolve_respects_kind() {
        let mut mgr = KeysManager::new();
        mgr.add_key(aes("only", 7));
        let request = KeyRequest {
            kind: KeyKind::Des3,
            usage: KeyUsage::Encrypt,
        };
        assert!(mgr.resolve(None, &request).is_none());
    }
}
