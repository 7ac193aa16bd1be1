#![forbid(unsafe_code)]

//! KeyInfo reading and rewriting.
//!
//! The engine reads `KeyName` out of `<dsig:KeyInfo>` for resolution
//! and, on encryption, rewrites the `KeyInfo` subtree to describe the
//! key actually chosen.

use crate::key::Key;
use solna_core::ns;
use solna_xml::{document, edit::Edit, writer};

/// Read the trimmed `KeyName` text from a `KeyInfo` element, if any.
pub fn read_key_name(key_info: roxmltree::Node<'_, '_>) -> Option<String> {
    let key_name = document::find_child_element(key_info, ns::DSIG, ns::node::KEY_NAME)?;
    let name = document::node_text(key_name);
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_owned())
    }
}

/// Rewrite a `KeyInfo` subtree to describe the chosen key.
///
/// Currently updates the `KeyName` child (when both it and the key's
/// name exist) to the resolved key's name.  Returns the edits to apply
/// to the document; empty when there is nothing to rewrite.
pub fn write_key_info(xml: &str, key_info: roxmltree::Node<'_, '_>, key: &Key) -> Vec<Edit> {
    let mut edits = Vec::new();
    if let (Some(key_name), Some(name)) = (
        document::find_child_element(key_info, ns::DSIG, ns::node::KEY_NAME),
        key.name.as_deref(),
    ) {
        edits.push(Edit::replace_content(
            xml,
            key_name,
            &writer::escape_text(name),
        ));
    }
    edits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyData, KeyUsage};

    #[test]
    fn reads_trimmed_key_name() {
        let xml = r#"<KeyInfo xmlns="http://www.w3.org/2000/09/xmldsig#"><KeyName>
            my-key </KeyName></KeyInfo>"#;
        let doc = solna_xml::parse(xml).unwrap();
        assert_eq!(
            read_key_name(doc.root_element()).as_deref(),
            Some("my-key")
        );
    }

    #[test]
    fn rewrites_key_name_to_resolved_key() {
        let xml = r#"<KeyInfo xmlns="http://www.w3.org/2000/09/xmldsig#"><KeyName/></KeyInfo>"#;
        let doc = solna_xml::parse(xml).unwrap();
        let key = Key::new(KeyData::Aes(vec![0; 16]), KeyUsage::Any).with_name("chosen");
        let edits = write_key_info(xml, doc.root_element(), &key);
        let out = solna_xml::edit::apply(xml, edits).unwrap();
        assert!(out.contains("<KeyName>chosen</KeyName>"));
    }

    #[test]
    fn no_edits_without_key_name_child() {
        let xml = r#"<KeyInfo xmlns="http://www.w3.org/2000/09/xmldsig#"/>"#;
        let doc = solna_xml::parse(xml).unwrap();
        let key = Key::new(KeyData::Aes(vec![0; 16]), KeyUsage::Any).with_name("chosen");
        assert!(write_key_info(xml, doc.root_element(), &key).is_empty());
    }
}
