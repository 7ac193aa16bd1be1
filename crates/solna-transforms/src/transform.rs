#![forbid(unsafe_code)]

//! The streaming transform trait.

use solna_core::{Error, Result};
use solna_keys::{Key, KeyRequest};

/// Direction a keyed transform runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Encrypt,
    Decrypt,
}

/// What a transform can process.  Only `Binary` transforms may join a
/// [`crate::Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Binary,
    Xml,
}

/// A streaming byte processor (cipher, codec, sink or source).
///
/// Write-driven use: any number of `update` calls followed by exactly
/// one `finish`.  A transform may buffer; `finish` is the barrier after
/// which all output has been emitted.
///
/// Read-driven use: a *source* transform implements `produce` instead
/// and is placed at the head of a pipeline.  `produce` returning 0
/// means end-of-stream — the owner then runs the finish cascade; there
/// is no separate flush signal for sources.
pub trait Transform: Send {
    /// The algorithm URI (or source URI for inputs).
    fn uri(&self) -> &str;

    /// What this transform can process.
    fn kind(&self) -> TransformKind {
        TransformKind::Binary
    }

    /// Push bytes in, get any ready output back.
    fn update(&mut self, input: &[u8]) -> Result<Vec<u8>>;

    /// Signal end-of-stream and emit all remaining output.
    fn finish(&mut self) -> Result<Vec<u8>>;

    /// Pull bytes out of a source transform.  0 means end-of-stream.
    fn produce(&mut self, buf: &mut [u8]) -> Result<usize> {
        let _ = buf;
        Err(Error::Transform(format!("{} is not a source", self.uri())))
    }

    /// Install key material.  Only keyed transforms accept a key.
    fn set_key(&mut self, key: &Key) -> Result<()> {
        let _ = key;
        Err(Error::Key(format!("{} does not take a key", self.uri())))
    }

    /// Set the processing direction.  Ignored by unkeyed transforms.
    fn set_mode(&mut self, mode: Mode) {
        let _ = mode;
    }

    /// The key this transform needs to run in `mode`, if any.
    fn key_request(&self, mode: Mode) -> Option<KeyRequest> {
        let _ = mode;
        None
    }

    /// Remove and return the collected buffer of a sink transform.
    fn take_buffer(&mut self) -> Option<Vec<u8>> {
        None
    }
}
