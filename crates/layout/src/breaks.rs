//! Mapping overflow boundaries on a fragment back to source coordinates.

use crate::fragment::PageFragment;
use crate::region::{Boundary, Overflow, OverflowRegion};
use crate::token::{BreakToken, BreakTokens};
use quire_dom::{Document, SourceTree};
use quire_types::NodeId;

/// Break tokens for every region of `overflow`, in the same order.
///
/// Regions that cannot be mapped are dropped; `None` when none could be.
pub fn build_tokens(source: &SourceTree, page: &PageFragment, overflow: &Overflow) -> Option<BreakTokens> {
    let tokens: Vec<BreakToken> = overflow
        .iter()
        .filter_map(|region| region_token(source, page, region))
        .collect();
    BreakTokens::from_vec(tokens)
}

fn region_token(source: &SourceTree, page: &PageFragment, region: &OverflowRegion) -> Option<BreakToken> {
    match region.start {
        Boundary::Before(node) if page.is_element(node) => element_token(source, page, node),
        Boundary::Before(node) => text_token(source, page, node, 0),
        Boundary::Text { node, offset } => text_token(source, page, node, offset),
    }
}

fn element_token(source: &SourceTree, page: &PageFragment, node: NodeId) -> Option<BreakToken> {
    if let Some(origin) = page.origin(node) {
        return Some(BreakToken::at(origin));
    }

    // Content created on the page itself: resume after the last node that
    // came from the source.
    let mut previous = prev_valid_node(page, node)?;
    if !page.is_element(previous) {
        previous = page.parent(previous)?;
    }
    let source_previous = page.origin(previous)?;
    if page.next_sibling(node).is_none() {
        let last = last_element_descendant(source, source_previous);
        if page.lookup(last).is_none() {
            log::debug!("{} is not fully rendered yet; deferring its break token", source_previous);
            return None;
        }
    }
    source.next_sibling(source_previous).map(BreakToken::at)
}

fn text_token(source: &SourceTree, page: &PageFragment, node: NodeId, offset: usize) -> Option<BreakToken> {
    let Some(origin) = page.origin(node) else {
        log::warn!("Text {} has no source node; dropping its break token", node);
        return None;
    };
    let source_offset = page.text_node(node).map_or(0, |t| t.source_offset);
    if offset == 0 && source_offset == 0 {
        if let Some(parent) = source.parent(origin) {
            if parent != source.root() && source.first_child(parent) == Some(origin) {
                return Some(BreakToken::at(parent));
            }
        }
    }
    Some(BreakToken::new(origin, source_offset + offset))
}

/// Nearest node before `node` in document order that came from the source.
fn prev_valid_node(doc: &Document, node: NodeId) -> Option<NodeId> {
    let mut current = node;
    loop {
        current = match doc.prev_sibling(current) {
            Some(sibling) => doc.last_descendant(sibling),
            None => doc.parent(current)?,
        };
        if doc.origin(current).is_some() {
            return Some(current);
        }
    }
}

fn last_element_descendant(doc: &Document, node: NodeId) -> NodeId {
    doc.descendants(node)
        .filter(|&n| doc.is_element(n))
        .last()
        .unwrap_or(node)
}
