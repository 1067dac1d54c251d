use quire_dom::{Document, SourceTree, serialize};
use quire_types::NodeId;
use std::collections::HashMap;
use std::ops::Deref;

pub const NAMED_PAGE_CLASS: &str = "quire-named-page";

/// The output of one page pass: cloned content plus an index from source
/// node to clone.
#[derive(Debug, Clone)]
pub struct PageFragment {
    doc: Document,
    refs: HashMap<NodeId, NodeId>,
    named_page: Option<String>,
    page_classes: Vec<String>,
}

impl PageFragment {
    /// An empty page whose root stands in for the source root.
    pub fn new(source: &SourceTree) -> Self {
        let mut doc = Document::new("div");
        let root = doc.root();
        doc.set_origin(root, Some(source.root()));
        let mut refs = HashMap::new();
        refs.insert(source.root(), root);
        Self {
            doc,
            refs,
            named_page: None,
            page_classes: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// The attached clone of `source_node`, if this page holds one.
    pub fn lookup(&self, source_node: NodeId) -> Option<NodeId> {
        self.refs
            .get(&source_node)
            .copied()
            .filter(|&n| self.doc.is_attached(n))
    }

    /// Indexes `clone` and every descendant under their source nodes.
    pub fn index_subtree(&mut self, clone: NodeId) {
        let entries: Vec<(NodeId, NodeId)> = self
            .doc
            .descendants(clone)
            .filter_map(|n| self.doc.origin(n).map(|o| (o, n)))
            .collect();
        self.refs.extend(entries);
    }

    pub fn named_page(&self) -> Option<&str> {
        self.named_page.as_deref()
    }

    /// Marks the page as an instance of the named page `name`.
    pub fn set_named_page(&mut self, name: &str, first: bool) {
        self.named_page = Some(name.to_string());
        self.add_page_class(NAMED_PAGE_CLASS);
        self.add_page_class(&format!("quire-{}-page", name));
        if first {
            self.add_page_class(&format!("quire-{}-first-page", name));
        }
    }

    pub fn page_classes(&self) -> &[String] {
        &self.page_classes
    }

    pub fn add_page_class(&mut self, class: &str) {
        if !self.page_classes.iter().any(|c| c == class) {
            self.page_classes.push(class.to_string());
        }
    }

    pub fn to_html(&self) -> String {
        serialize::to_html(&self.doc, self.doc.root())
    }

    pub fn text(&self) -> String {
        self.doc.text_content(self.doc.root())
    }

    /// True when nothing but whitespace was rendered.
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
            && self
                .doc
                .descendants(self.doc.root())
                .all(|n| n == self.doc.root() || !self.doc.has_tag(n, "img"))
    }
}

impl Deref for PageFragment {
    type Target = Document;

    fn deref(&self) -> &Document {
        &self.doc
    }
}
