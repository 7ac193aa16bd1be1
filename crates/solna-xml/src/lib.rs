#![forbid(unsafe_code)]

//! XML document access for the Solna XML Encryption library.
//!
//! Documents are owned strings parsed read-only with `roxmltree`;
//! mutation happens by splicing byte ranges of the backing text.  An
//! operation collects [`edit::Edit`]s while it works and applies them
//! all at once on success, so a failed operation leaves the input
//! document untouched.

pub mod document;
pub mod edit;
pub mod writer;

pub use document::parse;
pub use edit::Edit;
pub use writer::XmlWriter;
