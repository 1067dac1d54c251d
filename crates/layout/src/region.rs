//! Overflow regions and their removal from a page fragment.

use crate::token::OneOrMany;
use quire_dom::{Document, DomError};
use quire_types::NodeId;
use std::collections::HashMap;

/// Start of an overflow region in fragment coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Just before `node`; the node and everything after it overflow.
    Before(NodeId),
    /// Inside a text node; characters from `offset` on overflow.
    Text { node: NodeId, offset: usize },
}

impl Boundary {
    pub fn node(&self) -> NodeId {
        match *self {
            Boundary::Before(node) => node,
            Boundary::Text { node, .. } => node,
        }
    }
}

/// Content that must leave the current page: from `start` through the end
/// of the `end` node's subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowRegion {
    pub start: Boundary,
    pub end: NodeId,
}

impl OverflowRegion {
    pub fn new(start: Boundary, end: NodeId) -> Self {
        Self { start, end }
    }
}

/// One region, or one per table column that overflowed separately.
pub type Overflow = OneOrMany<OverflowRegion>;

/// Nodes removed from a fragment. They stay in the fragment's arena,
/// detached, so hooks can still inspect them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub nodes: Vec<NodeId>,
}

impl Extracted {
    pub fn text_content(&self, doc: &Document) -> String {
        self.nodes.iter().map(|&n| doc.text_content(n)).collect()
    }
}

/// Removes the content covered by `region` from `doc`.
///
/// Nodes that lie completely inside the region are detached, topmost
/// first. A text start boundary splits its node; ancestors that the region
/// only partially covers stay in place with their remaining children.
pub fn extract(doc: &mut Document, region: &OverflowRegion) -> Result<Extracted, DomError> {
    let root = doc.root();
    let order: Vec<NodeId> = doc.descendants(root).collect();
    let position: HashMap<NodeId, usize> =
        order.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let pos = |n: NodeId| position.get(&n).copied().ok_or(DomError::UnknownNode(n));

    let end = pos(doc.last_descendant(region.end))? + 1;
    let start = match region.start {
        Boundary::Before(node) => pos(node)?,
        Boundary::Text { node, .. } => pos(node)? + 1,
    };

    let mut extracted = Extracted::default();
    if let Boundary::Text { node, offset } = region.start {
        if let Some(rest) = doc.split_text(node, offset) {
            extracted.nodes.push(rest);
        }
    }

    let contained = |doc: &Document, n: NodeId| -> Result<bool, DomError> {
        let first = pos(n)?;
        let last = pos(doc.last_descendant(n))?;
        Ok(n != root && first >= start && last < end)
    };

    let mut topmost = Vec::new();
    for &node in order.iter().take(end).skip(start) {
        let parent_contained = match doc.parent(node) {
            Some(parent) => contained(&*doc, parent)?,
            None => false,
        };
        if contained(&*doc, node)? && !parent_contained {
            topmost.push(node);
        }
    }

    for node in topmost {
        doc.detach(node)?;
        extracted.nodes.push(node);
    }
    Ok(extracted)
}
