#![forbid(unsafe_code)]

//! Range-splice edits over a document string.
//!
//! An operation accumulates edits while it inspects a parsed document
//! and applies them in one pass at the end.  Ranges refer to the
//! original text; edits must not overlap.

use crate::document;
use roxmltree::Node;
use solna_core::{Error, Result};
use std::ops::Range;

/// A single replacement of a byte range with new text.
#[derive(Debug, Clone)]
pub struct Edit {
    pub range: Range<usize>,
    pub text: String,
}

impl Edit {
    /// Replace the whole element.
    pub fn replace_node(node: Node<'_, '_>, text: impl Into<String>) -> Edit {
        Edit {
            range: node.range(),
            text: text.into(),
        }
    }

    /// Insert a fragment immediately before the element.
    pub fn insert_before(node: Node<'_, '_>, text: impl Into<String>) -> Edit {
        let start = node.range().start;
        Edit {
            range: start..start,
            text: text.into(),
        }
    }

    /// Insert a fragment immediately after the element.
    pub fn insert_after(node: Node<'_, '_>, text: impl Into<String>) -> Edit {
        let end = node.range().end;
        Edit {
            range: end..end,
            text: text.into(),
        }
    }

    /// Replace the element's content, keeping its tags and attributes.
    ///
    /// A self-closing element is rebuilt in open/close form.
    pub fn replace_content(xml: &str, node: Node<'_, '_>, content: &str) -> Edit {
        match document::content_range(xml, node) {
            Some(range) => Edit {
                range,
                text: content.to_owned(),
            },
            None => Edit::replace_node(node, rebuild_with_content(xml, node, content)),
        }
    }

    /// Insert a fragment as the element's first child.
    pub fn insert_first_child(xml: &str, node: Node<'_, '_>, fragment: &str) -> Edit {
        match document::open_tag_end(xml, node) {
            Some(pos) => Edit {
                range: pos..pos,
                text: fragment.to_owned(),
            },
            None => Edit::replace_node(node, rebuild_with_content(xml, node, fragment)),
        }
    }

    /// Insert a fragment as the element's last child.
    pub fn insert_last_child(xml: &str, node: Node<'_, '_>, fragment: &str) -> Edit {
        match document::close_tag_start(xml, node) {
            Some(pos) => Edit {
                range: pos..pos,
                text: fragment.to_owned(),
            },
            None => Edit::replace_node(node, rebuild_with_content(xml, node, fragment)),
        }
    }
}

/// Rebuild a self-closing element as `<qname attrs…>content</qname>`.
fn rebuild_with_content(xml: &str, node: Node<'_, '_>, content: &str) -> String {
    let source = document::dump_node(xml, node);
    let qname = document::qualified_name(xml, node);
    let open = source
        .strip_suffix("/>")
        .map(|head| head.trim_end())
        .unwrap_or(source);
    format!("{open}>{content}</{qname}>")
}

/// Apply a batch of edits, returning the new document text.
///
/// Edits are applied back to front so earlier ranges stay valid.
pub fn apply(xml: &str, mut edits: Vec<Edit>) -> Result<String> {
    edits.sort_by(|a, b| b.range.start.cmp(&a.range.start));
    for pair in edits.windows(2) {
        // sorted descending: pair[1] precedes pair[0] in the document
        if pair[1].range.end > pair[0].range.start {
            return Err(Error::XmlStructure("overlapping edits".into()));
        }
    }
    let mut out = xml.to_owned();
    for edit in edits {
        if edit.range.end > out.len() {
            return Err(Error::XmlStructure("edit range out of bounds".into()));
        }
        out.replace_range(edit.range.clone(), &edit.text);
    }
    Ok(out)
}

/// Apply a single edit.
pub fn apply_one(xml: &str, edit: Edit) -> Result<String> {
    apply(xml, vec![edit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{find_element, parse};

    #[test]
    fn replace_and_insert() {
        let xml = "<r><a>1</a><b/></r>";
        let doc = parse(xml).unwrap();
        let a = find_element(&doc, "", "a").unwrap();
        let b = find_element(&doc, "", "b").unwrap();
        let edits = vec![
            Edit::replace_node(a, "<a>2</a>"),
            Edit::insert_after(b, "<c/>"),
        ];
        assert_eq!(apply(xml, edits).unwrap(), "<r><a>2</a><b/><c/></r>");
    }

    #[test]
    fn self_closing_rebuild() {
        let xml = r#"<r><a k="v"/></r>"#;
        let doc = parse(xml).unwrap();
        let a = find_element(&doc, "", "a").unwrap();
        let edit = Edit::insert_first_child(xml, a, "<x/>");
        assert_eq!(apply_one(xml, edit).unwrap(), r#"<r><a k="v"><x/></a></r>"#);
    }

    #[test]
    fn replace_content_keeps_tags() {
        let xml = "<r><a>old text</a></r>";
        let doc = parse(xml).unwrap();
        let a = find_element(&doc, "", "a").unwrap();
        let edit = Edit::replace_content(xml, a, "new");
        assert_eq!(apply_one(xml, edit).unwrap(), "<r><a>new</a></r>");
    }

    #[test]
    fn overlapping_edits_rejected() {
        let xml = "<r><a>1</a></r>";
        let doc = parse(xml).unwrap();
        let a = find_element(&doc, "", "a").unwrap();
        let edits = vec![
            Edit::replace_node(a, "<a/>"),
            Edit::replace_content(xml, a, "x"),
        ];
        assert!(apply(xml, edits).is_err());
    }
}
