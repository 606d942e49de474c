//! DOM Operations Adapter
//!
//! Thin helpers over `dom_query` used by the rule engine, the sanitizer and
//! the prune filter. dom_query keeps every node in one arena addressed by
//! `NodeId`; removing a node only detaches it, so handles taken before a
//! removal stay valid and can still be serialized.

pub use dom_query::{Document, NodeRef, Selection};
pub use tendril::StrTendril;

/// Parse an HTML string into a document.
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

/// The document's root element (`<html>`), if there is one.
#[must_use]
pub fn root_element(doc: &Document) -> Option<NodeRef<'_>> {
    doc.root().children().into_iter().find(NodeRef::is_element)
}

/// Lowercase tag name of an element node.
#[must_use]
pub fn tag_name(node: &NodeRef) -> Option<String> {
    if !node.is_element() {
        return None;
    }
    node.node_name().map(|t| t.to_ascii_lowercase())
}

/// Attribute value of an element node.
#[inline]
#[must_use]
pub fn get_attribute(node: &NodeRef, name: &str) -> Option<StrTendril> {
    node.attr(name)
}

/// All attributes as `(name, value)` pairs, in source order.
#[must_use]
pub fn get_all_attributes(node: &NodeRef) -> Vec<(String, String)> {
    node.attrs()
        .iter()
        .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
        .collect()
}

/// Direct element children, skipping text and comment nodes.
#[must_use]
pub fn element_children<'a>(node: &NodeRef<'a>) -> Vec<NodeRef<'a>> {
    node.children().into_iter().filter(NodeRef::is_element).collect()
}

/// All descendant elements in document order.
#[must_use]
pub fn descendant_elements<'a>(node: &NodeRef<'a>) -> Vec<NodeRef<'a>> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeRef<'a>> = node.children().into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        if current.is_element() {
            out.push(current);
        }
        stack.extend(current.children().into_iter().rev());
    }
    out
}

/// Text of the node and all its descendants.
#[inline]
#[must_use]
pub fn text_content(node: &NodeRef) -> StrTendril {
    node.text()
}

/// Serialized markup of the node itself and its subtree.
#[inline]
#[must_use]
pub fn outer_html(node: &NodeRef) -> StrTendril {
    Selection::from(*node).html()
}

/// Serialize the whole document.
#[inline]
#[must_use]
pub fn document_html(doc: &Document) -> StrTendril {
    doc.html()
}

/// Detach a node (and its subtree) from the tree.
#[inline]
pub fn remove(node: &NodeRef) {
    Selection::from(*node).remove();
}

/// Remove descendant elements with the given tags but keep their children.
#[inline]
pub fn strip_tags(sel: &Selection, tags: &[&str]) {
    sel.strip_elements(tags);
}

/// Remove an attribute from an element.
#[inline]
pub fn remove_attribute(node: &NodeRef, name: &str) {
    Selection::from(*node).remove_attr(name);
}

/// Whether every child of the node is text.
///
/// Comments and other non-text children count, so `<p>a<!-- b --></p>` is
/// not a leaf.
#[must_use]
pub fn has_only_text_children(node: &NodeRef) -> bool {
    node.children().iter().all(NodeRef::is_text)
}
