#![forbid(unsafe_code)]

//! Streaming base64 encode/decode transforms.

use crate::transform::Transform;
use base64::Engine;
use solna_core::{algorithm, Error, Result};

fn engine() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// Base64 encoder.  Encodes complete 3-byte groups as they arrive and
/// the remainder at end-of-stream.
pub struct Base64Encode {
    pending: Vec<u8>,
}

impl Base64Encode {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl Default for Base64Encode {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Base64Encode {
    fn uri(&self) -> &str {
        algorithm::BASE64
    }

    fn update(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.pending.extend_from_slice(input);
        let whole = self.pending.len() - self.pending.len() % 3;
        let out = engine().encode(&self.pending[..whole]);
        self.pending.drain(..whole);
        Ok(out.into_bytes())
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let out = engine().encode(&self.pending);
        self.pending.clear();
        Ok(out.into_bytes())
    }
}

/// Base64 decoder.  Whitespace is dropped; complete 4-character groups
/// decode as they arrive.
pub struct Base64Decode {
    pending: Vec<u8>,
}

impl Base64Decode {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl Default for Base64Decode {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Base64Decode {
    fn uri(&self) -> &str {
        algorithm::BASE64
    }

    fn update(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.pending
            .extend(input.iter().copied().filter(|b| !b.is_ascii_whitespace()));
        let whole = self.pending.len() - self.pending.len() % 4;
        let out = engine()
            .decode(&self.pending[..whole])
            .map_err(|e| Error::Base64(format!("decode error: {e}")))?;
        self.pending.drain(..whole);
        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        let out = engine()
            .decode(&self.pending)
            .map_err(|e| Error::Base64(format!("decode error: {e}")))?;
        self.pending.clear();
        Ok(out)
    }
}
