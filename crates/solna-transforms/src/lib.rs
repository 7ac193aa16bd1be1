#![forbid(unsafe_code)]

//! Transform pipeline engine for the Solna XML Encryption library.
//!
//! Encryption and decryption are expressed as a chain of streaming
//! binary transforms (cipher, base64 codec, memory sink, URI source)
//! driven either write-at-head or read-at-tail.

pub mod base64_transform;
pub mod cipher;
pub mod input_uri;
pub mod membuf;
pub mod pipeline;
pub mod reference;
pub mod registry;
pub mod transform;

pub use pipeline::Pipeline;
pub use transform::{Mode, Transform, TransformKind};
