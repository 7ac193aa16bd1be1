#![forbid(unsafe_code)]

//! Template builders for authoring `EncryptedData` skeletons.
//!
//! Builders are functional over document strings: each one parses the
//! input, validates, and returns a new document with the node added.
//! A failing builder leaves the caller's document unchanged.

use roxmltree::{Document, Node};
use solna_core::{ns, Error, Result};
use solna_transforms::registry;
use solna_xml::{document, edit, writer::XmlWriter, Edit};

/// Create a new `EncryptedData` document with the namespace attached
/// and an empty `CipherData` child.
pub fn create_encrypted_data(
    id: Option<&str>,
    enc_type: Option<&str>,
    mime_type: Option<&str>,
    encoding: Option<&str>,
) -> String {
    let mut attrs: Vec<(&str, &str)> = vec![("xmlns", ns::ENC)];
    if let Some(v) = id {
        attrs.push((ns::attr::ID, v));
    }
    if let Some(v) = enc_type {
        attrs.push((ns::attr::TYPE, v));
    }
    if let Some(v) = mime_type {
        attrs.push((ns::attr::MIME_TYPE, v));
    }
    if let Some(v) = encoding {
        attrs.push((ns::attr::ENCODING, v));
    }

    let mut w = XmlWriter::new();
    w.start_element(ns::node::ENCRYPTED_DATA, &attrs);
    w.empty_element(ns::node::CIPHER_DATA, &[]);
    w.end_element(ns::node::ENCRYPTED_DATA);
    w.into_string()
}

/// Add an `EncryptionMethod` with the given algorithm as the first
/// element child.  Fails with `NodeAlreadyPresent` if one exists.
pub fn add_encryption_method(xml: &str, method_uri: &str) -> Result<String> {
    let doc = document::parse(xml)?;
    let enc_node = encrypted_data(&doc)?;
    if document::find_child_element(enc_node, ns::ENC, ns::node::ENCRYPTION_METHOD).is_some() {
        return Err(Error::NodeAlreadyPresent(ns::node::ENCRYPTION_METHOD.into()));
    }

    let qname = qname_for(xml, enc_node, ns::node::ENCRYPTION_METHOD);
    let fragment = empty_fragment(&qname, &[(ns::attr::ALGORITHM, method_uri)]);
    let edit = match document::first_element_child(enc_node) {
        Some(first) => Edit::insert_before(first, fragment),
        None => Edit::insert_first_child(xml, enc_node, &fragment),
    };
    edit::apply_one(xml, edit)
}

/// Add a `KeyInfo` element after `EncryptionMethod` when present, else
/// first.  Fails with `NodeAlreadyPresent` if one exists.
pub fn add_key_info(xml: &str) -> Result<String> {
    let doc = document::parse(xml)?;
    let enc_node = encrypted_data(&doc)?;
    if document::find_child_element(enc_node, ns::DSIG, ns::node::KEY_INFO).is_some() {
        return Err(Error::NodeAlreadyPresent(ns::node::KEY_INFO.into()));
    }

    let fragment = empty_fragment(ns::node::KEY_INFO, &[("xmlns", ns::DSIG)]);
    let method = document::find_child_element(enc_node, ns::ENC, ns::node::ENCRYPTION_METHOD);
    let edit = match (method, document::first_element_child(enc_node)) {
        (Some(method), _) => Edit::insert_after(method, fragment),
        (None, Some(first)) => Edit::insert_before(first, fragment),
        (None, None) => Edit::insert_first_child(xml, enc_node, &fragment),
    };
    edit::apply_one(xml, edit)
}

/// Add a `KeyName` carrying `name` inside `KeyInfo`.
pub fn add_key_name(xml: &str, name: &str) -> Result<String> {
    let doc = document::parse(xml)?;
    let enc_node = encrypted_data(&doc)?;
    let key_info = document::find_child_element(enc_node, ns::DSIG, ns::node::KEY_INFO)
        .ok_or_else(|| Error::NodeNotFound(ns::node::KEY_INFO.into()))?;
    if document::find_child_element(key_info, ns::DSIG, ns::node::KEY_NAME).is_some() {
        return Err(Error::NodeAlreadyPresent(ns::node::KEY_NAME.into()));
    }

    let qname = qname_for(xml, key_info, ns::node::KEY_NAME);
    let mut w = XmlWriter::new();
    w.start_element(&qname, &[]);
    w.text(name);
    w.end_element(&qname);
    let edit = Edit::insert_last_child(xml, key_info, &w.into_string());
    edit::apply_one(xml, edit)
}

/// Add an `EncryptionProperties` container at the end.
pub fn add_encryption_properties(xml: &str, id: Option<&str>) -> Result<String> {
    let doc = document::parse(xml)?;
    let enc_node = encrypted_data(&doc)?;
    if document::find_child_element(enc_node, ns::ENC, ns::node::ENCRYPTION_PROPERTIES).is_some() {
        return Err(Error::NodeAlreadyPresent(ns::node::ENCRYPTION_PROPERTIES.into()));
    }

    let qname = qname_for(xml, enc_node, ns::node::ENCRYPTION_PROPERTIES);
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    if let Some(v) = id {
        attrs.push((ns::attr::ID, v));
    }
    let fragment = empty_fragment(&qname, &attrs);
    edit::apply_one(xml, Edit::insert_last_child(xml, enc_node, &fragment))
}

/// Add an `EncryptionProperty`, creating the `EncryptionProperties`
/// container on demand.
pub fn add_encryption_property(
    xml: &str,
    id: Option<&str>,
    target: Option<&str>,
) -> Result<String> {
    let doc = document::parse(xml)?;
    let enc_node = encrypted_data(&doc)?;
    if document::find_child_element(enc_node, ns::ENC, ns::node::ENCRYPTION_PROPERTIES).is_none() {
        let with_container = add_encryption_properties(xml, None)?;
        return add_encryption_property(&with_container, id, target);
    }

    let properties =
        document::find_child_element(enc_node, ns::ENC, ns::node::ENCRYPTION_PROPERTIES)
            .ok_or_else(|| Error::NodeNotFound(ns::node::ENCRYPTION_PROPERTIES.into()))?;
    let qname = qname_for(xml, properties, ns::node::ENCRYPTION_PROPERTY);
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    if let Some(v) = id {
        attrs.push((ns::attr::ID, v));
    }
    if let Some(v) = target {
        attrs.push((ns::attr::TARGET, v));
    }
    let fragment = empty_fragment(&qname, &attrs);
    edit::apply_one(xml, Edit::insert_last_child(xml, properties, &fragment))
}

/// Add an empty `CipherValue` inside `CipherData`.  Rejects templates
/// that already carry either `CipherValue` or `CipherReference`.
pub fn add_cipher_value(xml: &str) -> Result<String> {
    let doc = document::parse(xml)?;
    let cipher_data = cipher_data(&doc)?;
    reject_cipher_children(cipher_data)?;

    let qname = qname_for(xml, cipher_data, ns::node::CIPHER_VALUE);
    let fragment = empty_fragment(&qname, &[]);
    edit::apply_one(xml, Edit::insert_last_child(xml, cipher_data, &fragment))
}

/// Add a `CipherReference` with the given URI inside `CipherData`.
/// Rejects templates that already carry either sibling.
pub fn add_cipher_reference(xml: &str, uri: Option<&str>) -> Result<String> {
    let doc = document::parse(xml)?;
    let cipher_data = cipher_data(&doc)?;
    reject_cipher_children(cipher_data)?;

    let qname = qname_for(xml, cipher_data, ns::node::CIPHER_REFERENCE);
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    if let Some(v) = uri {
        attrs.push((ns::attr::URI, v));
    }
    let fragment = empty_fragment(&qname, &attrs);
    edit::apply_one(xml, Edit::insert_last_child(xml, cipher_data, &fragment))
}

/// Add a `Transform` under `CipherReference/Transforms`, creating the
/// `Transforms` container on demand.
pub fn add_cipher_reference_transform(xml: &str, transform_uri: &str) -> Result<String> {
    let doc = document::parse(xml)?;
    let cipher_data = cipher_data(&doc)?;
    let cipher_reference =
        document::find_child_element(cipher_data, ns::ENC, ns::node::CIPHER_REFERENCE)
            .ok_or_else(|| Error::NodeNotFound(ns::node::CIPHER_REFERENCE.into()))?;
    if !registry::is_reference_transform(transform_uri) {
        return Err(Error::UnsupportedAlgorithm(format!(
            "CipherReference transform: {transform_uri}"
        )));
    }

    let transform = empty_fragment(
        ns::node::TRANSFORM,
        &[
            (ns::attr::ALGORITHM, transform_uri),
            ("xmlns", ns::DSIG),
        ],
    );
    let edit = match document::find_child_element(cipher_reference, ns::ENC, ns::node::TRANSFORMS)
    {
        Some(transforms) => Edit::insert_last_child(xml, transforms, &transform),
        None => {
            let qname = qname_for(xml, cipher_reference, ns::node::TRANSFORMS);
            let fragment = format!("<{qname}>{transform}</{qname}>");
            Edit::insert_last_child(xml, cipher_reference, &fragment)
        }
    };
    edit::apply_one(xml, edit)
}

// ── helpers ──────────────────────────────────────────────────────────

fn encrypted_data<'a>(doc: &'a Document<'a>) -> Result<Node<'a, 'a>> {
    document::find_element(doc, ns::ENC, ns::node::ENCRYPTED_DATA)
        .ok_or_else(|| Error::NodeNotFound(ns::node::ENCRYPTED_DATA.into()))
}

fn cipher_data<'a>(doc: &'a Document<'a>) -> Result<Node<'a, 'a>> {
    let enc_node = encrypted_data(doc)?;
    document::find_child_element(enc_node, ns::ENC, ns::node::CIPHER_DATA)
        .ok_or_else(|| Error::NodeNotFound(ns::node::CIPHER_DATA.into()))
}

fn reject_cipher_children(cipher_data: Node<'_, '_>) -> Result<()> {
    if document::find_child_element(cipher_data, ns::ENC, ns::node::CIPHER_VALUE).is_some() {
        return Err(Error::NodeAlreadyPresent(ns::node::CIPHER_VALUE.into()));
    }
    if document::find_child_element(cipher_data, ns::ENC, ns::node::CIPHER_REFERENCE).is_some() {
        return Err(Error::NodeAlreadyPresent(ns::node::CIPHER_REFERENCE.into()));
    }
    Ok(())
}

/// New enc-namespace children take the prefix their parent was written
/// with so they resolve into the same namespace.
fn qname_for(xml: &str, parent: Node<'_, '_>, local: &str) -> String {
    crate::state::enc_child_qname(xml, parent, local)
}

fn empty_fragment(qname: &str, attrs: &[(&str, &str)]) -> String {
    let mut w = XmlWriter::new();
    w.empty_element(qname, attrs);
    w.into_string()
}
