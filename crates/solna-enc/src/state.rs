#![forbid(unsafe_code)]

//! Per-call engine state and the `EncryptedData` grammar reader.
//!
//! `EncryptedData` children follow a fixed order:
//! `EncryptionMethod?`, `KeyInfo?`, `CipherData` (required),
//! `EncryptionProperties?`.  The reader walks a single cursor over the
//! element children and rejects anything out of sequence.

use crate::context::EncContext;
use crate::result::EncResult;
use roxmltree::{Node, NodeId};
use solna_core::{ns, Error, Result};
use solna_keys::Key;
use solna_transforms::base64_transform::Base64Encode;
use solna_transforms::membuf::MemBuf;
use solna_transforms::{registry, Mode, Pipeline};
use solna_xml::{document, Edit};

/// Working state for a single encrypt/decrypt call.
///
/// Owns the transform pipeline; dropping the state tears down every
/// transform in it.
pub(crate) struct EncState {
    pub pipeline: Pipeline,
    pub cipher_data: Option<NodeId>,
    /// Document edits accumulated while reading (KeyInfo rewrite) and
    /// writing (ciphertext embedding); applied together on success.
    pub edits: Vec<Edit>,
}

/// Read an `EncryptedData` element into a fresh state, resolving the
/// key and assembling the transform pipeline.
pub(crate) fn read_encrypted_data(
    ctx: &EncContext,
    xml: &str,
    enc_node: Node<'_, '_>,
    encrypt: bool,
    supplied_key: Option<&Key>,
    result: &mut EncResult,
) -> Result<EncState> {
    result.id = enc_node.attribute(ns::attr::ID).map(str::to_owned);
    result.enc_type = enc_node.attribute(ns::attr::TYPE).map(str::to_owned);
    result.mime_type = enc_node.attribute(ns::attr::MIME_TYPE).map(str::to_owned);
    result.encoding = enc_node.attribute(ns::attr::ENCODING).map(str::to_owned);

    let mode = if encrypt { Mode::Encrypt } else { Mode::Decrypt };
    let mut pipeline = Pipeline::new();
    let mut edits = Vec::new();
    let mut cur = document::first_element_child(enc_node);

    // first node is the optional EncryptionMethod
    let mut method = match cur {
        Some(node) if document::is_named(node, ns::ENC, ns::node::ENCRYPTION_METHOD) => {
            cur = document::next_element_sibling(node);
            registry::encryption_method_node(node)?
        }
        _ => match ctx.default_method.as_deref() {
            Some(uri) => registry::encryption_method(uri)?,
            None => {
                return Err(Error::InvalidData("encryption method not specified".into()));
            }
        },
    };
    method.set_mode(mode);
    result.method = Some(method.uri().to_owned());
    let key_request = method.key_request(mode);
    pipeline.append(method)?;

    // next node is the optional KeyInfo
    let mut key_info = None;
    if let Some(node) = cur {
        if document::is_named(node, ns::DSIG, ns::node::KEY_INFO) {
            key_info = Some(node);
            cur = document::next_element_sibling(node);
        }
    }

    // resolve the key; the KeyInfo node may be absent
    let key = match supplied_key {
        Some(key) => key.clone(),
        None => {
            let request = key_request.ok_or_else(|| {
                Error::Key(format!(
                    "{} does not take a key",
                    result.method.as_deref().unwrap_or("")
                ))
            })?;
            ctx.resolver
                .resolve(key_info, &request)
                .ok_or_else(|| {
                    Error::KeyNotFound(format!(
                        "no usable key for {}",
                        result.method.as_deref().unwrap_or("")
                    ))
                })?
        }
    };
    let method_transform = pipeline
        .first_mut()
        .ok_or_else(|| Error::Transform("empty pipeline".into()))?;
    method_transform.set_key(&key)?;
    if encrypt {
        if let Some(node) = key_info {
            // describe the chosen key in the template
            edits.extend(solna_keys::keyinfo::write_key_info(xml, node, &key));
        }
    }
    result.key = Some(key);

    // next is the required CipherData
    let cipher_data = match cur {
        Some(node) if document::is_named(node, ns::ENC, ns::node::CIPHER_DATA) => node,
        _ => return Err(Error::InvalidNode("CipherData".into())),
    };
    // the optional trailing EncryptionProperties is ignored

    // encryption emits base64 text into a memory sink
    if encrypt {
        pipeline.append(Box::new(Base64Encode::new()))?;
        pipeline.append(Box::new(MemBuf::new()))?;
    }

    Ok(EncState {
        pipeline,
        cipher_data: Some(cipher_data.id()),
        edits,
    })
}

/// Embed ciphertext into a `CipherData` element.
///
/// Creates or overwrites `CipherValue` with the base64 text framed by
/// newlines; an existing `CipherReference` means the ciphertext lives
/// elsewhere and nothing is written.
pub(crate) fn write_cipher_data(
    xml: &str,
    cipher_data: Node<'_, '_>,
    base64_text: &[u8],
) -> Result<Option<Edit>> {
    let text = std::str::from_utf8(base64_text)
        .map_err(|e| Error::XmlStructure(format!("ciphertext is not base64 text: {e}")))?;
    let content = format!("\n{text}\n");

    let child = match document::first_element_child(cipher_data) {
        None => {
            let qname = enc_child_qname(xml, cipher_data, ns::node::CIPHER_VALUE);
            let fragment = format!("<{qname}>{content}</{qname}>");
            return Ok(Some(Edit::insert_last_child(xml, cipher_data, &fragment)));
        }
        Some(child) => child,
    };

    let edit = if document::is_named(child, ns::ENC, ns::node::CIPHER_VALUE) {
        Some(Edit::replace_content(xml, child, &content))
    } else if document::is_named(child, ns::ENC, ns::node::CIPHER_REFERENCE) {
        None
    } else {
        return Err(Error::InvalidNode(child.tag_name().name().to_owned()));
    };

    if let Some(extra) = document::next_element_sibling(child) {
        return Err(Error::InvalidNode(extra.tag_name().name().to_owned()));
    }
    Ok(edit)
}

/// The qualified name to write for a new enc-namespace child, matching
/// the prefix its parent was written with.
pub(crate) fn enc_child_qname(xml: &str, parent: Node<'_, '_>, local: &str) -> String {
    match document::element_prefix(xml, parent) {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_owned(),
    }
}
