#![forbid(unsafe_code)]

//! The caller-facing record of a completed encrypt/decrypt call.

use solna_keys::Key;
use std::io::{self, Write};

/// Result of an encryption or decryption call.
///
/// Attribute copies are owned strings, independent of any parse.
#[derive(Debug)]
pub struct EncResult {
    /// Direction of the completed call.
    pub encrypt: bool,
    /// Whether a node was replaced in the document.
    pub replaced: bool,
    /// The key the call ran with, origin preserved.
    pub key: Option<Key>,
    /// The resolved `EncryptionMethod` algorithm URI.
    pub method: Option<String>,
    /// On encrypt, the base64 text written into `CipherValue`; on
    /// decrypt, the recovered plaintext.
    pub buffer: Option<Vec<u8>>,
    /// Copy of `EncryptedData/@Id`.
    pub id: Option<String>,
    /// Copy of `EncryptedData/@Type`.
    pub enc_type: Option<String>,
    /// Copy of `EncryptedData/@MimeType`.
    pub mime_type: Option<String>,
    /// Copy of `EncryptedData/@Encoding`.
    pub encoding: Option<String>,
    /// The resulting document text (template with ciphertext embedded,
    /// or the decrypted/spliced document).
    pub document: String,
    /// The filled `EncryptedData` element on its own, when encrypting.
    pub encrypted_data: Option<String>,
}

impl EncResult {
    pub(crate) fn new(encrypt: bool) -> Self {
        Self {
            encrypt,
            replaced: false,
            key: None,
            method: None,
            buffer: None,
            id: None,
            enc_type: None,
            mime_type: None,
            encoding: None,
            document: String::new(),
            encrypted_data: None,
        }
    }

    /// Print a human-readable dump of the result.
    pub fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.encrypt {
            writeln!(out, "= ENCRYPTION RESULT")?;
        } else {
            writeln!(
                out,
                "= DECRYPTION RESULT ({})",
                if self.replaced { "replaced" } else { "not-replaced" }
            )?;
        }
        if let Some(id) = &self.id {
            writeln!(out, "== Id: \"{id}\"")?;
        }
        if let Some(t) = &self.enc_type {
            writeln!(out, "== Type: \"{t}\"")?;
        }
        if let Some(mime) = &self.mime_type {
            writeln!(out, "== MimeType: \"{mime}\"")?;
        }
        if let Some(encoding) = &self.encoding {
            writeln!(out, "== Encoding: \"{encoding}\"")?;
        }
        if let Some(method) = &self.method {
            writeln!(out, "== Method: \"{method}\"")?;
        }
        if let Some(key) = &self.key {
            writeln!(out, "== Key: {:?} (origin {:?})", key.data, key.origin)?;
        }
        if let Some(buffer) = &self.buffer {
            writeln!(out, "== start buffer:")?;
            out.write_all(buffer)?;
            writeln!(out, "\n== end buffer")?;
        }
        Ok(())
    }
}
