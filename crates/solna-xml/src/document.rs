#![forbid(unsafe_code)]

//! Parsing, lookup and serialization helpers over `roxmltree`.

use roxmltree::{Document, Node, NodeId};
use solna_core::{ns, Error, Result};
use std::collections::HashMap;
use std::ops::Range;

/// Parsing options shared by every parse in the library.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    let mut options = roxmltree::ParsingOptions::default();
    options.allow_dtd = true;
    options
}

/// Parse an XML document.
pub fn parse(xml: &str) -> Result<Document<'_>> {
    Document::parse_with_options(xml, parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))
}

/// Build the ID value → node mapping for a parsed document.
///
/// `extra_attrs` lists caller-registered ID attribute names beyond the
/// default `Id` used by XML Encryption.
pub fn build_id_map(doc: &Document<'_>, extra_attrs: &[String]) -> HashMap<String, NodeId> {
    let mut map = HashMap::new();
    for node in doc.descendants() {
        if !node.is_element() {
            continue;
        }
        if let Some(val) = node.attribute(ns::attr::ID) {
            map.insert(val.to_owned(), node.id());
        }
        for name in extra_attrs {
            if let Some(val) = node.attribute(name.as_str()) {
                map.insert(val.to_owned(), node.id());
            }
        }
    }
    map
}

/// Check whether a node is an element with the given namespace and local name.
pub fn is_named(node: Node<'_, '_>, ns_uri: &str, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace().unwrap_or("") == ns_uri
}

/// Find the first descendant element with the given namespace and local name.
pub fn find_element<'a>(
    doc: &'a Document<'a>,
    ns_uri: &str,
    local_name: &str,
) -> Option<Node<'a, 'a>> {
    doc.descendants().find(|n| is_named(*n, ns_uri, local_name))
}

/// Find the first direct child element with the given namespace and local name.
pub fn find_child_element<'a>(
    parent: Node<'a, 'a>,
    ns_uri: &str,
    local_name: &str,
) -> Option<Node<'a, 'a>> {
    parent.children().find(|n| is_named(*n, ns_uri, local_name))
}

/// The first element among a node's children.
pub fn first_element_child<'a>(parent: Node<'a, 'a>) -> Option<Node<'a, 'a>> {
    parent.children().find(|n| n.is_element())
}

/// The next element sibling of a node.
pub fn next_element_sibling<'a>(node: Node<'a, 'a>) -> Option<Node<'a, 'a>> {
    let mut cur = node.next_sibling();
    while let Some(n) = cur {
        if n.is_element() {
            return Some(n);
        }
        cur = n.next_sibling();
    }
    None
}

/// Collect the text content of a node and all its descendants.
pub fn node_text(node: Node<'_, '_>) -> String {
    let mut text = String::new();
    for n in node.descendants() {
        if n.is_text() {
            text.push_str(n.text().unwrap_or(""));
        }
    }
    text
}

// ── Raw-text structure helpers ───────────────────────────────────────
//
// These inspect the source text behind a node.  They are the basis of
// all splice edits: serialization of an element is just its byte range,
// and insertions are computed against the open/close tag positions.

/// The qualified name (including prefix) exactly as written in the source.
pub fn qualified_name<'a>(xml: &'a str, node: Node<'_, '_>) -> &'a str {
    let slice = &xml[node.range()];
    let name = slice.trim_start_matches('<');
    let end = name
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(name.len());
    &name[..end]
}

/// The namespace prefix the element was written with, if any.
pub fn element_prefix<'a>(xml: &'a str, node: Node<'_, '_>) -> Option<&'a str> {
    let qname = qualified_name(xml, node);
    qname.find(':').map(|pos| &qname[..pos])
}

/// Byte position just past the `>` of the element's open tag, or `None`
/// for a self-closing element.
pub fn open_tag_end(xml: &str, node: Node<'_, '_>) -> Option<usize> {
    let range = node.range();
    let bytes = xml[range.clone()].as_bytes();
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => {
                    if i > 0 && bytes[i - 1] == b'/' {
                        return None;
                    }
                    return Some(range.start + i + 1);
                }
                _ => {}
            },
        }
    }
    None
}

/// Byte position of the `</` opening the element's close tag, or `None`
/// for a self-closing element.
pub fn close_tag_start(xml: &str, node: Node<'_, '_>) -> Option<usize> {
    open_tag_end(xml, node)?;
    let range = node.range();
    xml[range.clone()].rfind("</").map(|pos| range.start + pos)
}

/// The byte range between an element's open and close tags.
///
/// Empty range at the rebuild position for a self-closing element.
pub fn content_range(xml: &str, node: Node<'_, '_>) -> Option<Range<usize>> {
    let start = open_tag_end(xml, node)?;
    let end = close_tag_start(xml, node)?;
    Some(start..end)
}

/// Serialize an element: its exact source text.
pub fn dump_node<'a>(xml: &'a str, node: Node<'_, '_>) -> &'a str {
    &xml[node.range()]
}

/// Serialize an element's content (children in document order).
pub fn dump_content<'a>(xml: &'a str, node: Node<'_, '_>) -> &'a str {
    match content_range(xml, node) {
        Some(range) => &xml[range],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_close_tag_positions() {
        let xml = r#"<root><a b="x>y"><c/></a><d/></root>"#;
        let doc = parse(xml).unwrap();
        let a = find_element(&doc, "", "a").unwrap();
        // open tag ends after the attribute containing '>'
        let open = open_tag_end(xml, a).unwrap();
        assert_eq!(&xml[open..open + 4], "<c/>");
        let close = close_tag_start(xml, a).unwrap();
        assert_eq!(&xml[close..close + 4], "</a>");

        let d = find_element(&doc, "", "d").unwrap();
        assert!(open_tag_end(xml, d).is_none());
        assert!(close_tag_start(xml, d).is_none());
    }

    #[test]
    fn dumps_match_source() {
        let xml = "<root><item key=\"v\">text<sub/></item></root>";
        let doc = parse(xml).unwrap();
        let item = find_element(&doc, "", "item").unwrap();
        assert_eq!(dump_node(xml, item), "<item key=\"v\">text<sub/></item>");
        assert_eq!(dump_content(xml, item), "text<sub/>");
    }

    #[test]
    fn qualified_name_keeps_prefix() {
        let xml = r#"<x:root xmlns:x="urn:a"><x:leaf/></x:root>"#;
        let doc = parse(xml).unwrap();
        let leaf = find_element(&doc, "urn:a", "leaf").unwrap();
        assert_eq!(qualified_name(xml, leaf), "x:leaf");
        assert_eq!(element_prefix(xml, leaf), Some("x"));
    }

    #[test]
    fn id_map_covers_extra_attrs() {
        let xml = r#"<r><a Id="one"/><b myId="two"/></r>"#;
        let doc = parse(xml).unwrap();
        let map = build_id_map(&doc, &["myId".to_owned()]);
        assert!(map.contains_key("one"));
        assert!(map.contains_key("two"));
    }
}
