//! Pre-order traversal that can start anywhere and be redirected mid-walk.

use crate::text::is_blank;
use crate::tree::Document;
use quire_types::NodeId;

/// A resumable pre-order walk over one document.
///
/// The walk starts at an arbitrary node and continues in document order past
/// the end of that node's subtree, climbing ancestors, until it runs out of
/// nodes or would climb out of `limiter`.
#[derive(Debug, Clone)]
pub struct TreeCursor<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
    limiter: Option<NodeId>,
}

impl<'a> TreeCursor<'a> {
    pub fn new(doc: &'a Document, start: NodeId, limiter: Option<NodeId>) -> Self {
        Self {
            doc,
            next: Some(start),
            limiter,
        }
    }

    /// Continues after `node`'s subtree; its descendants are not visited.
    pub fn skip_subtree(&mut self, node: NodeId) {
        self.next = following(self.doc, node, self.limiter);
    }

    /// Jumps the walk to `node`; it is the next node yielded.
    pub fn reseed(&mut self, node: NodeId) {
        self.next = Some(node);
    }
}

impl Iterator for TreeCursor<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = match self.doc.first_child(current) {
            Some(child) => Some(child),
            None => following(self.doc, current, self.limiter),
        };
        Some(current)
    }
}

/// First node after `node`'s subtree in document order, staying inside `limiter`.
fn following(doc: &Document, node: NodeId, limiter: Option<NodeId>) -> Option<NodeId> {
    let mut current = node;
    loop {
        if Some(current) == limiter {
            return None;
        }
        if let Some(sibling) = doc.next_sibling(current) {
            return Some(sibling);
        }
        current = doc.parent(current)?;
    }
}

/// Whitespace-only text, which never affects where a page breaks.
pub fn is_ignorable(doc: &Document, node: NodeId) -> bool {
    doc.text(node).is_some_and(is_blank)
}

fn next_significant(doc: &Document, node: NodeId) -> Option<NodeId> {
    let mut sibling = doc.next_sibling(node);
    while let Some(n) = sibling {
        if !is_ignorable(doc, n) {
            return Some(n);
        }
        sibling = doc.next_sibling(n);
    }
    None
}

fn prev_significant(doc: &Document, node: NodeId) -> Option<NodeId> {
    let mut sibling = doc.prev_sibling(node);
    while let Some(n) = sibling {
        if !is_ignorable(doc, n) {
            return Some(n);
        }
        sibling = doc.prev_sibling(n);
    }
    None
}

/// The next significant sibling of `node` or of its nearest ancestor that
/// has one, never climbing past `limiter`.
pub fn node_after(doc: &Document, node: NodeId, limiter: Option<NodeId>) -> Option<NodeId> {
    let mut current = node;
    loop {
        if Some(current) == limiter {
            return None;
        }
        if let Some(n) = next_significant(doc, current) {
            return Some(n);
        }
        current = doc.parent(current)?;
    }
}

/// Mirror of [`node_after`] walking backwards.
pub fn node_before(doc: &Document, node: NodeId, limiter: Option<NodeId>) -> Option<NodeId> {
    let mut current = node;
    loop {
        if Some(current) == limiter {
            return None;
        }
        if let Some(n) = prev_significant(doc, current) {
            return Some(n);
        }
        current = doc.parent(current)?;
    }
}

/// First child of `node` that is not ignorable whitespace.
pub fn first_significant_child(doc: &Document, node: NodeId) -> Option<NodeId> {
    doc.children(node)
        .iter()
        .copied()
        .find(|&c| !is_ignorable(doc, c))
}
