use crate::config::MetricsConfig;
use crate::fragment::PageFragment;
use crate::metrics::FlowMetrics;
use quire_dom::{Document, SourceTree};
use quire_types::{NodeId, PageBounds};

/// A node description used to build test documents.
pub enum Sketch {
    Element {
        tag: &'static str,
        attrs: Vec<(&'static str, String)>,
        children: Vec<Sketch>,
    },
    Text(String),
}

pub fn el(tag: &'static str, children: Vec<Sketch>) -> Sketch {
    Sketch::Element {
        tag,
        attrs: Vec::new(),
        children,
    }
}

pub fn el_with(tag: &'static str, attrs: &[(&'static str, &str)], children: Vec<Sketch>) -> Sketch {
    Sketch::Element {
        tag,
        attrs: attrs.iter().map(|&(k, v)| (k, v.to_string())).collect(),
        children,
    }
}

pub fn text(content: &str) -> Sketch {
    Sketch::Text(content.to_string())
}

/// `<p>` holding a single text node.
pub fn para(content: &str) -> Sketch {
    el("p", vec![text(content)])
}

fn append(doc: &mut Document, parent: NodeId, sketch: &Sketch) {
    match sketch {
        Sketch::Text(content) => {
            doc.append_text(parent, content.as_str()).unwrap();
        }
        Sketch::Element {
            tag,
            attrs,
            children,
        } => {
            let node = doc.append_element(parent, tag).unwrap();
            for (name, value) in attrs {
                doc.set_attr(node, name, value.as_str());
            }
            for child in children {
                append(doc, node, child);
            }
        }
    }
}

/// A prepared source whose `body` holds `children`.
pub fn build_source(children: Vec<Sketch>) -> SourceTree {
    let mut doc = Document::new("body");
    let root = doc.root();
    for child in &children {
        append(&mut doc, root, child);
    }
    SourceTree::new(doc).unwrap()
}

/// Monospace metrics of 10x10 per character, laid out in `bounds`.
pub fn metrics(bounds: &PageBounds) -> FlowMetrics {
    FlowMetrics::for_bounds(
        MetricsConfig {
            char_width: 10.0,
            line_height: 10.0,
        },
        bounds,
    )
}

/// A fragment holding a deep copy of the whole source.
pub fn full_page(source: &SourceTree) -> PageFragment {
    let mut page = PageFragment::new(source);
    let root = page.root();
    for &child in source.children(source.root()) {
        let clone = page.document_mut().import(source, child, true);
        page.document_mut().append_child(root, clone).unwrap();
        page.index_subtree(clone);
    }
    page
}

/// The `nth` node (in document order) with the given tag.
pub fn nth(doc: &Document, tag: &str, n: usize) -> NodeId {
    doc.descendants(doc.root())
        .filter(|&node| doc.has_tag(node, tag))
        .nth(n)
        .unwrap_or_else(|| panic!("no {} #{}", tag, n))
}

/// The first text node whose content is exactly `content`.
pub fn text_node(doc: &Document, content: &str) -> NodeId {
    doc.descendants(doc.root())
        .find(|&node| doc.text(node) == Some(content))
        .unwrap_or_else(|| panic!("no text {:?}", content))
}

/// The fragment clone of `source_node`.
pub fn clone_of(page: &PageFragment, source_node: NodeId) -> NodeId {
    page.lookup(source_node)
        .unwrap_or_else(|| panic!("{} is not on the page", source_node))
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
