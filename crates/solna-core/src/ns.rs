#![forbid(unsafe_code)]

//! XML namespace, element and attribute constants used across the library.

/// XML Encryption namespace
pub const ENC: &str = "http://www.w3.org/2001/04/xmlenc#";

/// XML Digital Signature namespace (KeyInfo and friends live here)
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

// ── Element names ────────────────────────────────────────────────────

pub mod node {
    // Encryption elements
    pub const ENCRYPTED_DATA: &str = "EncryptedData";
    pub const ENCRYPTION_METHOD: &str = "EncryptionMethod";
    pub const ENCRYPTION_PROPERTIES: &str = "EncryptionProperties";
    pub const ENCRYPTION_PROPERTY: &str = "EncryptionProperty";
    pub const CIPHER_DATA: &str = "CipherData";
    pub const CIPHER_VALUE: &str = "CipherValue";
    pub const CIPHER_REFERENCE: &str = "CipherReference";

    // KeyInfo elements (dsig namespace)
    pub const KEY_INFO: &str = "KeyInfo";
    pub const KEY_NAME: &str = "KeyName";

    // CipherReference transforms
    pub const TRANSFORMS: &str = "Transforms";
    pub const TRANSFORM: &str = "Transform";
    pub const XPATH: &str = "XPath";

    // RSA-OAEP EncryptionMethod parameters
    pub const DIGEST_METHOD: &str = "DigestMethod";
    pub const RSA_OAEP_PARAMS: &str = "OAEPparams";
}

// ── Attribute names ──────────────────────────────────────────────────

pub mod attr {
    pub const ID: &str = "Id";
    pub const URI: &str = "URI";
    pub const TYPE: &str = "Type";
    pub const MIME_TYPE: &str = "MimeType";
    pub const ENCODING: &str = "Encoding";
    pub const ALGORITHM: &str = "Algorithm";
    pub const TARGET: &str = "Target";
}

// ── Encryption type URIs ─────────────────────────────────────────────

pub const ENC_TYPE_ELEMENT: &str = "http://www.w3.org/2001/04/xmlenc#Element";
pub const ENC_TYPE_CONTENT: &str = "http://www.w3.org/2001/04/xmlenc#Content";
