#![forbid(unsafe_code)]

//! URI input source transform.
//!
//! Reads from a local file (plain path or `file://` URI).  This is the
//! only I/O the engine performs; it happens synchronously inside
//! `produce`.

use crate::transform::Transform;
use solna_core::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};

/// A source transform feeding bytes from a URI.
pub struct InputUri {
    uri: String,
    reader: BufReader<File>,
}

impl InputUri {
    /// Open the URI for reading.
    pub fn open(uri: &str) -> Result<Self> {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        let file = File::open(path)
            .map_err(|e| Error::InvalidUri(format!("cannot open {uri}: {e}")))?;
        Ok(Self {
            uri: uri.to_owned(),
            reader: BufReader::new(file),
        })
    }
}

impl Transform for InputUri {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn update(&mut self, _input: &[u8]) -> Result<Vec<u8>> {
        Err(Error::Transform("uri input is read-only".into()))
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    fn produce(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.reader.read(buf)?)
    }
}
