use quire_types::NodeId;

/// An element: lowercase tag name, attributes in insertion order and classes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub classes: Vec<String>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    /// Integer attribute such as `rowspan`; missing or malformed values yield `None`.
    pub fn usize_attr(&self, name: &str) -> Option<usize> {
        self.attr(name).and_then(|v| v.trim().parse().ok())
    }
}

/// Character data. `source_offset` is the character offset inside the source
/// text this node was cloned from; it is non-zero only for continuations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Text {
    pub content: String,
    pub source_offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(Element),
    Text(Text),
}

#[derive(Debug, Clone)]
pub struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// The source node this node was cloned from.
    pub(crate) origin: Option<NodeId>,
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            origin: None,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn origin(&self) -> Option<NodeId> {
        self.origin
    }
}
