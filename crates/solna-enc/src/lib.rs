#![forbid(unsafe_code)]

//! XML Encryption (XML-Enc) implementation.
//!
//! Processes `<enc:EncryptedData>` elements per the W3C XML Encryption
//! spec: encryption templates are filled in place, encrypted documents
//! are decrypted and optionally spliced back together.

pub mod context;
pub mod decrypt;
pub mod encrypt;
pub mod result;
pub mod template;

mod state;

pub use context::EncContext;
pub use decrypt::decrypt;
pub use encrypt::{encrypt_memory, encrypt_uri, encrypt_xml_node, Target};
pub use result::EncResult;
