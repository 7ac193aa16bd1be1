#![forbid(unsafe_code)]

//! Key material and key resolution for the Solna XML Encryption library.
//!
//! The encryption engine never inspects `KeyInfo` itself; it hands the
//! node (when present) and an explicit [`KeyRequest`] to a
//! [`KeyResolver`].  [`KeysManager`] is the bundled resolver: a named
//! key store with `KeyName` lookup.

pub mod key;
pub mod keyinfo;
pub mod loader;
pub mod manager;

pub use key::{Key, KeyData, KeyKind, KeyOrigin, KeyUsage};
pub use manager::{KeyRequest, KeyResolver, KeysManager};
