#![forbid(unsafe_code)]

//! Core types for the Solna XML Encryption library.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
