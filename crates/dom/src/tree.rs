use crate::DomError;
use crate::attrs;
use crate::node::{Element, NodeData, NodeKind, Text};
use quire_types::NodeId;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// An arena of nodes with a single element root.
///
/// Node ids are never reused: detached nodes stay in the arena so that ids
/// handed out earlier (extracted overflow, hook arguments) remain valid.
/// Every mutation bumps [`Document::generation`], which geometry providers
/// use to invalidate cached layouts.
#[derive(Debug)]
pub struct Document {
    id: u64,
    generation: u64,
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Clone for Document {
    fn clone(&self) -> Self {
        Self {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
            nodes: self.nodes.clone(),
            root: self.root,
        }
    }
}

impl Document {
    pub fn new(root_tag: &str) -> Self {
        let root = NodeData::new(NodeKind::Element(Element::new(root_tag)));
        Self {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
            nodes: vec![root],
            root: NodeId::new(0),
        }
    }

    /// Process-unique identity of this arena.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever allocated, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index())
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.generation += 1;
        &mut self.nodes[id.index()]
    }

    fn check(&self, id: NodeId) -> Result<(), DomError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(DomError::UnknownNode(id))
        }
    }

    // --- Creation ---

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::new(NodeKind::Element(Element::new(tag))))
    }

    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeData::new(NodeKind::Text(Text {
            content: content.into(),
            source_offset: 0,
        })))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(data);
        self.generation += 1;
        id
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let id = self.create_element(tag);
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn append_text(
        &mut self,
        parent: NodeId,
        content: impl Into<String>,
    ) -> Result<NodeId, DomError> {
        let id = self.create_text(content);
        self.append_child(parent, id)?;
        Ok(id)
    }

    // --- Structure mutation ---

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Inserts `child` at `index` among `parent`'s children, detaching it
    /// from wherever it was first. `index` is clamped to the child count.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        self.check(parent)?;
        self.check(child)?;
        if child == self.root {
            return Err(DomError::RootMutation);
        }
        if !self.is_element(parent) {
            return Err(DomError::NotAnElement(parent));
        }
        if self.contains(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }

        let mut index = index;
        if let Some(old_parent) = self.data(child).parent {
            let old_index = self.index_in_parent(child);
            self.detach(child)?;
            if old_parent == parent && old_index.is_some_and(|i| i < index) {
                index -= 1;
            }
        }

        let siblings = &mut self.data_mut(parent).children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.data_mut(child).parent = Some(parent);
        Ok(())
    }

    pub fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        self.check(node)?;
        if node == self.root {
            return Err(DomError::RootMutation);
        }
        if let Some(parent) = self.data(node).parent {
            self.data_mut(parent).children.retain(|&c| c != node);
            self.data_mut(node).parent = None;
        }
        Ok(())
    }

    // --- Navigation ---

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.data(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Deepest last descendant of `id`, or `id` itself when it has no children.
    pub fn last_descendant(&self, id: NodeId) -> NodeId {
        let mut node = id;
        while let Some(last) = self.last_child(node) {
            node = last;
        }
        node
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Pre-order traversal of `id`'s subtree, `id` included.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    /// True when `node` is `ancestor` or lies inside its subtree.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    /// Nearest ancestor-or-self element whose tag is one of `tags`.
    pub fn closest(&self, id: NodeId, tags: &[&str]) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.tag(n).is_some_and(|t| tags.contains(&t)))
    }

    /// Like [`Document::closest`] but never looks at or above `limit`.
    pub fn closest_within(&self, id: NodeId, tags: &[&str], limit: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .take_while(|&n| n != limit)
            .find(|&n| self.tag(n).is_some_and(|t| tags.contains(&t)))
    }

    // --- Node content ---

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Text(_))
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.data_mut(id).kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text_node(&self, id: NodeId) -> Option<&Text> {
        match self.kind(id) {
            NodeKind::Text(t) => Some(t),
            NodeKind::Element(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.text_node(id).map(|t| t.content.as_str())
    }

    pub fn set_text(&mut self, id: NodeId, content: impl Into<String>) {
        if let NodeKind::Text(t) = &mut self.data_mut(id).kind {
            t.content = content.into();
        }
    }

    pub fn set_source_offset(&mut self, id: NodeId, offset: usize) {
        if let NodeKind::Text(t) = &mut self.data_mut(id).kind {
            t.source_offset = offset;
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.set_attr(name, value);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            el.add_class(class);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id).and_then(|el| el.remove_attr(name))
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            el.remove_class(class);
        }
    }

    pub fn ref_id(&self, id: NodeId) -> Option<&str> {
        self.attr(id, attrs::REF)
    }

    pub fn origin(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).origin
    }

    pub fn set_origin(&mut self, id: NodeId, origin: Option<NodeId>) {
        self.data_mut(id).origin = origin;
    }

    /// Cuts text `node` after `offset` characters. The remainder becomes a
    /// new detached text node with the same origin and a source offset that
    /// continues where the kept part ends.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> Option<NodeId> {
        let text = self.text_node(node)?.clone();
        let head = crate::text::prefix(&text.content, offset).to_string();
        let tail = crate::text::suffix(&text.content, offset).to_string();
        let kept = crate::text::char_len(&head);

        self.set_text(node, head);
        let rest = self.push(NodeData::new(NodeKind::Text(Text {
            content: tail,
            source_offset: text.source_offset + kept,
        })));
        let origin = self.data(node).origin;
        self.data_mut(rest).origin = origin;
        Some(rest)
    }

    /// Concatenated character data of the subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|n| self.text(n))
            .collect()
    }

    // --- Cloning across documents ---

    /// Clones `node` from `src` into this arena, detached. A deep import
    /// brings the whole subtree; every created node records its origin.
    pub fn import(&mut self, src: &Document, node: NodeId, deep: bool) -> NodeId {
        let mut data = NodeData::new(src.kind(node).clone());
        data.origin = Some(node);
        let clone = self.push(data);
        if deep {
            for &child in src.children(node) {
                let child_clone = self.import(src, child, true);
                self.data_mut(child_clone).parent = Some(clone);
                self.data_mut(clone).children.push(child_clone);
            }
        }
        clone
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.next?;
        self.next = self.doc.parent(node);
        Some(node)
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(node).iter().rev().copied());
        Some(node)
    }
}
