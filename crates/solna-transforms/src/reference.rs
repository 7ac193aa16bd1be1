#![forbid(unsafe_code)]

//! `CipherReference` resolution: URI fetch, declared transforms, and
//! pipeline transfer.
//!
//! A [`ReferenceState`] fetches the referenced octets, applies the
//! transforms declared under `CipherReference/Transforms`, then takes
//! ownership of the cipher pipeline's transforms one by one and
//! finalizes to the binary result.

use crate::base64_transform::Base64Decode;
use crate::transform::{Transform, TransformKind};
use roxmltree::{Document, Node, NodeId};
use solna_core::{algorithm, ns, Error, Result};
use solna_xml::document;
use std::collections::HashMap;

/// Working state for a `CipherReference`.
pub struct ReferenceState {
    data: Vec<u8>,
}

impl ReferenceState {
    /// Fetch the octets a `CipherReference` URI points at.
    ///
    /// Supported forms: `""` (the whole document's text), `#id`
    /// (same-document reference), and local files (plain path or
    /// `file://`).  Remote schemes are rejected.
    pub fn open(
        doc: &Document<'_>,
        id_map: &HashMap<String, NodeId>,
        uri: &str,
    ) -> Result<Self> {
        let data = if uri.is_empty() {
            let mut text = String::new();
            for node in doc.descendants() {
                if node.is_text() {
                    text.push_str(node.text().unwrap_or(""));
                }
            }
            text.into_bytes()
        } else if let Some(id) = uri.strip_prefix('#') {
            let node_id = id_map
                .get(id)
                .copied()
                .ok_or_else(|| Error::InvalidUri(format!("cannot resolve #{id}")))?;
            let node = doc
                .get_node(node_id)
                .ok_or_else(|| Error::InvalidUri(format!("cannot resolve #{id}")))?;
            document::node_text(node).into_bytes()
        } else if let Some(rest) = uri.split_once("://") {
            match rest.0 {
                "file" => std::fs::read(rest.1)
                    .map_err(|e| Error::InvalidUri(format!("cannot read {uri}: {e}")))?,
                scheme => {
                    return Err(Error::InvalidUri(format!(
                        "unsupported URI scheme {scheme}: {uri}"
                    )))
                }
            }
        } else {
            std::fs::read(uri).map_err(|e| Error::InvalidUri(format!("cannot read {uri}: {e}")))?
        };
        Ok(Self { data })
    }

    /// Apply the transforms declared under a `Transforms` element, in
    /// document order.
    pub fn apply_declared(
        &mut self,
        doc: &Document<'_>,
        id_map: &HashMap<String, NodeId>,
        transforms: Node<'_, '_>,
    ) -> Result<()> {
        for child in transforms.children() {
            if !document::is_named(child, ns::DSIG, ns::node::TRANSFORM) {
                continue;
            }
            let uri = child
                .attribute(ns::attr::ALGORITHM)
                .ok_or_else(|| Error::MissingAttribute("Algorithm on Transform".into()))?;
            match uri {
                algorithm::BASE64 => self.apply(Box::new(Base64Decode::new()))?,
                algorithm::XPATH => {
                    let filter = XPathFilter::from_node(child)?;
                    self.data = filter.select(doc, id_map)?;
                }
                _ => {
                    return Err(Error::UnsupportedAlgorithm(format!(
                        "CipherReference transform: {uri}"
                    )))
                }
            }
        }
        Ok(())
    }

    /// Run one binary transform over the current data, taking ownership
    /// of it.  Used to drain the cipher pipeline front to back.
    pub fn apply(&mut self, mut transform: Box<dyn Transform>) -> Result<()> {
        let mut out = transform.update(&self.data)?;
        out.extend(transform.finish()?);
        self.data = out;
        Ok(())
    }

    /// Finalize to the binary result.
    pub fn into_binary(self) -> Vec<u8> {
        self.data
    }
}

// ── XPath filter ─────────────────────────────────────────────────────

/// The restricted XPath form allowed under `CipherReference`:
///
/// ```text
/// self::text()[parent::PREFIX:ELEM[@Id="VALUE"]]
/// ```
///
/// selecting the text content of the named element.  XML-only: it never
/// joins a binary pipeline.
pub struct XPathFilter {
    expression: String,
    ns_uri: String,
    local_name: String,
    id_value: String,
}

impl XPathFilter {
    /// Build from a `<Transform>` element containing an `<XPath>` child.
    /// The prefix is resolved against the namespace declarations in
    /// scope at the `XPath` element.
    pub fn from_node(transform: Node<'_, '_>) -> Result<Self> {
        let xpath_node = transform
            .children()
            .find(|n| document::is_named(*n, ns::DSIG, ns::node::XPATH))
            .ok_or_else(|| Error::NodeNotFound("XPath in CipherReference transform".into()))?;
        let expression = document::node_text(xpath_node);
        let expression = expression.trim();

        let (prefix, local, id) = Self::split_expression(expression)?;
        let ns_uri = if prefix.is_empty() {
            String::new()
        } else {
            xpath_node
                .lookup_namespace_uri(Some(prefix))
                .ok_or_else(|| {
                    Error::XmlStructure(format!("undeclared XPath prefix: {prefix}"))
                })?
                .to_owned()
        };
        Ok(Self {
            expression: expression.to_owned(),
            ns_uri,
            local_name: local.to_owned(),
            id_value: id.to_owned(),
        })
    }

    /// Build from a raw expression with an explicit namespace URI.
    pub fn from_expression(expression: &str, ns_uri: &str) -> Result<Self> {
        let (_, local, id) = Self::split_expression(expression)?;
        Ok(Self {
            expression: expression.to_owned(),
            ns_uri: ns_uri.to_owned(),
            local_name: local.to_owned(),
            id_value: id.to_owned(),
        })
    }

    fn split_expression(expression: &str) -> Result<(&str, &str, &str)> {
        let unsupported =
            || Error::UnsupportedAlgorithm(format!("XPath expression: {expression}"));

        let rest = expression
            .strip_prefix("self::text()[parent::")
            .and_then(|r| r.strip_suffix(']'))
            .ok_or_else(unsupported)?;
        let bracket = rest.find('[').ok_or_else(unsupported)?;
        let name_part = &rest[..bracket];
        let pred_part = &rest[bracket..];

        let (prefix, local) = match name_part.find(':') {
            Some(pos) => (&name_part[..pos], &name_part[pos + 1..]),
            None => ("", name_part),
        };

        // predicate: [@Id="VALUE"] or [@Id='VALUE']
        let inner = pred_part
            .strip_prefix("[@Id=")
            .and_then(|r| r.strip_suffix(']'))
            .ok_or_else(unsupported)?;
        let id = inner
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .or_else(|| inner.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')))
            .ok_or_else(unsupported)?;

        Ok((prefix, local, id))
    }

    /// Evaluate against a document: the text content of the matching
    /// element.
    pub fn select(
        &self,
        doc: &Document<'_>,
        id_map: &HashMap<String, NodeId>,
    ) -> Result<Vec<u8>> {
        // ID lookup first, then a full scan for non-registered Id attrs
        if let Some(node) = id_map.get(&self.id_value).and_then(|&id| doc.get_node(id)) {
            if document::is_named(node, &self.ns_uri, &self.local_name) {
                return Ok(document::node_text(node).into_bytes());
            }
        }
        for node in doc.descendants() {
            if document::is_named(node, &self.ns_uri, &self.local_name)
                && node.attribute(ns::attr::ID) == Some(self.id_value.as_str())
            {
                return Ok(document::node_text(node).into_bytes());
            }
        }
        Err(Error::Transform(format!(
            "XPath matched no element: {}",
            self.expression
        )))
    }
}

impl Transform for XPathFilter {
    fn uri(&self) -> &str {
        algorithm::XPATH
    }

    fn kind(&self) -> TransformKind {
        TransformKind::Xml
    }

    fn update(&mut self, _input: &[u8]) -> Result<Vec<u8>> {
        Err(Error::InvalidTransform(algorithm::XPATH.to_owned()))
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        Err(Error::InvalidTransform(algorithm::XPATH.to_owned()))
    }
}
