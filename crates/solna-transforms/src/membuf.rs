#![forbid(unsafe_code)]

//! Memory-buffer sink transform.

use crate::transform::Transform;
use solna_core::Result;

/// Collects everything written through it while passing the bytes on
/// unchanged.  Placed at the tail of a pipeline to capture the result.
pub struct MemBuf {
    buf: Vec<u8>,
}

impl MemBuf {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }
}

impl Default for MemBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for MemBuf {
    fn uri(&self) -> &str {
        "membuf"
    }

    fn update(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.buf.extend_from_slice(input);
        Ok(input.to_vec())
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    fn take_buffer(&mut self) -> Option<Vec<u8>> {
        Some(std::mem::take(&mut self.buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_and_passes_through() {
        let mut sink = MemBuf::new();
        assert_eq!(sink.update(b"ab").unwrap(), b"ab");
        assert_eq!(sink.update(b"cd").unwrap(), b"cd");
        sink.finish().unwrap();
        assert_eq!(sink.take_buffer().unwrap(), b"abcd");
        // removing flavor: the sink no longer holds the data
        assert_eq!(sink.take_buffer().unwrap(), b"");
    }
}
