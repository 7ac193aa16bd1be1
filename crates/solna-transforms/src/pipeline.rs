#![forbid(unsafe_code)]

//! The transform pipeline.
//!
//! An ordered, owned chain of binary transforms.  Bytes keep arrival
//! order; `flush` is a total barrier.  The pipeline owns its transforms
//! and tears them down on drop, so every error path releases the whole
//! chain exactly once.

use crate::transform::{Transform, TransformKind};
use solna_core::{Error, Result};

/// An ordered chain of owned binary transforms.
pub struct Pipeline {
    chain: Vec<Box<dyn Transform>>,
    finished: bool,
    /// Tail output not yet handed to a reader in read-driven mode.
    pending: Vec<u8>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self {
            chain: Vec::new(),
            finished: false,
            pending: Vec::new(),
        }
    }

    /// Add a transform at the tail.
    pub fn append(&mut self, transform: Box<dyn Transform>) -> Result<()> {
        Self::check_binary(&*transform)?;
        self.chain.push(transform);
        Ok(())
    }

    /// Add a transform at the head.
    pub fn prepend(&mut self, transform: Box<dyn Transform>) -> Result<()> {
        Self::check_binary(&*transform)?;
        self.chain.insert(0, transform);
        Ok(())
    }

    fn check_binary(transform: &dyn Transform) -> Result<()> {
        if transform.kind() != TransformKind::Binary {
            return Err(Error::InvalidTransform(transform.uri().to_owned()));
        }
        Ok(())
    }

    /// Remove and return the head transform.
    pub fn pop_front(&mut self) -> Option<Box<dyn Transform>> {
        if self.chain.is_empty() {
            None
        } else {
            Some(self.chain.remove(0))
        }
    }

    /// Mutable access to the head transform.
    pub fn first_mut(&mut self) -> Option<&mut Box<dyn Transform>> {
        self.chain.first_mut()
    }

    /// Mutable access to the tail transform.
    pub fn last_mut(&mut self) -> Option<&mut Box<dyn Transform>> {
        self.chain.last_mut()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Push bytes in at the head; each transform's output feeds its
    /// successor.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.finished {
            return Err(Error::Transform("pipeline already flushed".into()));
        }
        let mut data = data.to_vec();
        for transform in &mut self.chain {
            data = transform.update(&data)?;
        }
        Ok(())
    }

    /// Push the end-of-stream barrier through the chain.
    ///
    /// Finishes each transform in order, feeding its tail output
    /// through the remainder of the chain.  Idempotent.
    pub fn flush(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.cascade_finish()?;
        Ok(())
    }

    /// Run the finish cascade, returning whatever the tail emitted.
    fn cascade_finish(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for i in 0..self.chain.len() {
            let (head, tail) = self.chain.split_at_mut(i + 1);
            let mut data = head[i].finish()?;
            for transform in tail.iter_mut() {
                data = transform.update(&data)?;
            }
            out.extend(data);
        }
        Ok(out)
    }

    /// Read-driven mode: pull chunks from the head (which must be a
    /// source transform) and push them through the rest of the chain.
    ///
    /// Returns the number of bytes written into `buf`.  Tail output
    /// that does not fit is held back for the next call, and internal
    /// pulls repeat until there is output to hand over, so buffering
    /// transforms never make a round look empty.  Returns 0 exactly
    /// once the source is exhausted, all output has been handed over
    /// and the finish cascade has run — "read returned 0" *is* the
    /// end-of-stream signal, no flush call is needed.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.chain.is_empty() {
            return Err(Error::Transform("pipeline is empty".into()));
        }
        if buf.is_empty() {
            return Err(Error::Transform("read buffer is empty".into()));
        }
        loop {
            if !self.pending.is_empty() {
                let copied = self.pending.len().min(buf.len());
                buf[..copied].copy_from_slice(&self.pending[..copied]);
                self.pending.drain(..copied);
                return Ok(copied);
            }
            if self.finished {
                return Ok(0);
            }
            let mut scratch = vec![0u8; buf.len()];
            let n = self.chain[0].produce(&mut scratch)?;
            if n == 0 {
                self.finished = true;
                let tail_out = self.cascade_finish()?;
                self.pending.extend(tail_out);
                continue;
            }
            let mut data = scratch[..n].to_vec();
            for transform in self.chain.iter_mut().skip(1) {
                data = transform.update(&data)?;
            }
            self.pending.extend(data);
        }
    }

    /// Remove the collected buffer from the tail sink.
    pub fn take_sink_buffer(&mut self) -> Option<Vec<u8>> {
        self.chain.last_mut()?.take_buffer()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
