#![forbid(unsafe_code)]

/// Errors produced by the Solna XML Encryption library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("unexpected element in sequence: {0}")]
    InvalidNode(String),

    #[error("required node not found: {0}")]
    NodeNotFound(String),

    #[error("node already present: {0}")]
    NodeAlreadyPresent(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("unrecognized Type value: {0}")]
    InvalidType(String),

    #[error("transform is not usable here: {0}")]
    InvalidTransform(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("transform error: {0}")]
    Transform(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("invalid URI reference: {0}")]
    InvalidUri(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
