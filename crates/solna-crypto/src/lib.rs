#![forbid(unsafe_code)]

//! Cryptographic primitives for the Solna XML Encryption library.
//!
//! Block ciphers (AES-CBC, AES-GCM, 3DES-CBC) and RSA key transport
//! (PKCS#1 v1.5, OAEP).  Nothing here touches XML; the transform layer
//! wraps these behind the streaming transform interface.

pub mod cipher;
pub mod keytransport;

pub use cipher::CipherAlgorithm;
pub use keytransport::KeyTransportAlgorithm;
