#![forbid(unsafe_code)]

//! XML-Enc encryption.
//!
//! Takes a template with an `<enc:EncryptedData>` element, feeds the
//! source bytes through the cipher pipeline and embeds the base64
//! ciphertext in `CipherData`.  Three entry points differ only in
//! where the source bytes come from: a memory buffer, a URI, or an
//! XML node of the target document.

use crate::context::EncContext;
use crate::result::EncResult;
use crate::state::{self, EncState};
use roxmltree::{Document, Node, NodeId};
use solna_core::{ns, Error, Result};
use solna_keys::Key;
use solna_transforms::input_uri::InputUri;
use solna_xml::{document, edit, Edit};
use std::collections::HashMap;

/// Selects the source node for [`encrypt_xml_node`].
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// The element carrying this registered ID value.
    Id(&'a str),
    /// The first element with this namespace (`None` = no namespace)
    /// and local name.
    Element { ns: Option<&'a str>, local: &'a str },
}

/// Encrypt an in-memory buffer according to the template.
///
/// Returns the result with the filled template in `document`.
pub fn encrypt_memory(
    ctx: &EncContext,
    key: Option<&Key>,
    template_xml: &str,
    data: &[u8],
) -> Result<EncResult> {
    let doc = document::parse(template_xml)?;
    let enc_node = find_encrypted_data(&doc)?;
    let mut result = EncResult::new(true);
    let mut state = state::read_encrypted_data(ctx, template_xml, enc_node, true, key, &mut result)?;

    state.pipeline.write(data)?;
    state.pipeline.flush()?;

    result.document = write_result(template_xml, &doc, &mut state, &mut result)?;
    Ok(result)
}

/// Encrypt the bytes behind a URI according to the template.
///
/// The pipeline runs read-driven: a URI source is placed at the head
/// and drained to end-of-stream through a scratch buffer.
pub fn encrypt_uri(
    ctx: &EncContext,
    key: Option<&Key>,
    template_xml: &str,
    uri: &str,
) -> Result<EncResult> {
    let doc = document::parse(template_xml)?;
    let enc_node = find_encrypted_data(&doc)?;
    let mut result = EncResult::new(true);
    let mut state = state::read_encrypted_data(ctx, template_xml, enc_node, true, key, &mut result)?;

    state.pipeline.prepend(Box::new(InputUri::open(uri)?))?;
    let mut scratch = [0u8; 1024];
    while state.pipeline.read(&mut scratch)? > 0 {}

    result.document = write_result(template_xml, &doc, &mut state, &mut result)?;
    Ok(result)
}

/// Encrypt an XML node (or its content) of `doc_xml` according to the
/// template, splicing the filled `EncryptedData` element into the
/// document in its place.
///
/// The serialization and the replacement follow the template's `Type`
/// attribute: `#Element` takes the whole source element, `#Content`
/// its children; with no `Type` (or `ignore_type` set) the element is
/// encrypted but nothing is replaced.
pub fn encrypt_xml_node(
    ctx: &EncContext,
    key: Option<&Key>,
    doc_xml: &str,
    target: Target<'_>,
    template_xml: &str,
) -> Result<EncResult> {
    let doc = document::parse(doc_xml)?;
    let id_map = document::build_id_map(&doc, &ctx.id_attrs);
    let src = locate(&doc, &id_map, target)?;

    let template_doc = document::parse(template_xml)?;
    let enc_node = find_encrypted_data(&template_doc)?;
    let mut result = EncResult::new(true);
    let mut state = state::read_encrypted_data(ctx, template_xml, enc_node, true, key, &mut result)?;

    // serialize the source per the declared Type
    let payload: &str = if ctx.ignore_type || result.enc_type.is_none() {
        document::dump_node(doc_xml, src)
    } else {
        match result.enc_type.as_deref() {
            Some(ns::ENC_TYPE_ELEMENT) => document::dump_node(doc_xml, src),
            Some(ns::ENC_TYPE_CONTENT) => document::dump_content(doc_xml, src),
            Some(other) => return Err(Error::InvalidType(other.to_owned())),
            None => unreachable!(),
        }
    };

    state.pipeline.write(payload.as_bytes())?;
    state.pipeline.flush()?;

    write_result(template_xml, &template_doc, &mut state, &mut result)?;
    let enc_text = result
        .encrypted_data
        .clone()
        .ok_or_else(|| Error::NodeNotFound("EncryptedData".into()))?;

    // replace the source node per the declared Type
    result.document = if ctx.ignore_type {
        doc_xml.to_owned()
    } else {
        match result.enc_type.as_deref() {
            Some(ns::ENC_TYPE_ELEMENT) => {
                result.replaced = true;
                edit::apply_one(doc_xml, Edit::replace_node(src, enc_text))?
            }
            Some(ns::ENC_TYPE_CONTENT) => {
                result.replaced = true;
                edit::apply_one(doc_xml, Edit::replace_content(doc_xml, src, &enc_text))?
            }
            _ => doc_xml.to_owned(),
        }
    };
    Ok(result)
}

/// Locate the first `EncryptedData` element.
pub(crate) fn find_encrypted_data<'a>(doc: &'a Document<'a>) -> Result<Node<'a, 'a>> {
    document::find_element(doc, ns::ENC, ns::node::ENCRYPTED_DATA)
        .ok_or_else(|| Error::NodeNotFound(ns::node::ENCRYPTED_DATA.into()))
}

fn locate<'a>(
    doc: &'a Document<'a>,
    id_map: &HashMap<String, NodeId>,
    target: Target<'_>,
) -> Result<Node<'a, 'a>> {
    match target {
        Target::Id(id) => id_map
            .get(id)
            .and_then(|&node_id| doc.get_node(node_id))
            .ok_or_else(|| Error::NodeNotFound(format!("element with Id \"{id}\""))),
        Target::Element { ns, local } => doc
            .descendants()
            .find(|n| {
                n.is_element()
                    && n.tag_name().name() == local
                    && n.tag_name().namespace() == ns
            })
            .ok_or_else(|| Error::NodeNotFound(local.to_owned())),
    }
}

/// Take the sink buffer, embed it into `CipherData` and apply all
/// pending edits.  Returns the filled template document.
fn write_result(
    template_xml: &str,
    doc: &Document<'_>,
    state: &mut EncState,
    result: &mut EncResult,
) -> Result<String> {
    let base64_text = state
        .pipeline
        .take_sink_buffer()
        .ok_or_else(|| Error::Transform("pipeline has no sink buffer".into()))?;

    let cipher_node = state
        .cipher_data
        .and_then(|id| doc.get_node(id))
        .ok_or_else(|| Error::NodeNotFound(ns::node::CIPHER_DATA.into()))?;
    if let Some(edit) = state::write_cipher_data(template_xml, cipher_node, &base64_text)? {
        state.edits.push(edit);
    }
    result.buffer = Some(base64_text);

    let filled = edit::apply(template_xml, std::mem::take(&mut state.edits))?;
    let filled_doc = document::parse(&filled)?;
    let enc_node = find_encrypted_data(&filled_doc)?;
    result.encrypted_data = Some(document::dump_node(&filled, enc_node).to_owned());
    Ok(filled)
}
