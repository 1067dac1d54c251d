//! HTML-like serialization for debugging output and the CLI.

use crate::node::NodeKind;
use crate::tree::Document;
use quire_types::NodeId;
use std::fmt::Write;

const VOID_TAGS: &[&str] = &["br", "wbr", "img", "hr", "col", "input"];

/// Serializes `node` and its subtree.
pub fn to_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

/// Serializes the children of `node`, without `node`'s own tag.
pub fn inner_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for &child in doc.children(node) {
        write_node(doc, child, &mut out);
    }
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.kind(node) {
        NodeKind::Text(text) => escape_into(&text.content, false, out),
        NodeKind::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            if !el.classes.is_empty() {
                out.push_str(" class=\"");
                escape_into(&el.classes.join(" "), true, out);
                out.push('"');
            }
            for (name, value) in &el.attrs {
                let _ = write!(out, " {}=\"", name);
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');
            if VOID_TAGS.contains(&el.tag.as_str()) {
                return;
            }
            for &child in doc.children(node) {
                write_node(doc, child, out);
            }
            let _ = write!(out, "</{}>", el.tag);
        }
    }
}

fn escape_into(s: &str, attribute: bool, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
