//! The page pass: cloning source content into a fragment until it no
//! longer fits, then cutting it at a resumable break.

use crate::assets::{AssetLoader, ReadyAssets, wait_for_images};
use crate::breaks::build_tokens;
use crate::config::LayoutConfig;
use crate::fragment::PageFragment;
use crate::hooks::{HookEvent, Hooks, LayoutControl};
use crate::metrics::INLINE_TAGS;
use crate::oracle::GeometryOracle;
use crate::overflow::find_overflow;
use crate::region::{self, Boundary, Extracted, OverflowRegion};
use crate::token::{BreakToken, BreakTokens};
use crate::{LayoutError, OverflowContentError};
use quire_dom::table::{self, CELL_TAGS};
use quire_dom::text::{is_blank, suffix};
use quire_dom::{Document, InlineStyle, SourceTree, TreeCursor, attrs, classes, node_after, node_before};
use quire_types::{NodeId, PageBounds};

/// Break values that start a new page.
const FORCED_BREAKS: &[&str] = &["always", "page", "left", "right", "recto", "verso"];

/// Elements cloned together with their whole subtree.
const ATOMIC_TAGS: &[&str] = &[
    "img", "video", "canvas", "svg", "iframe", "object", "embed", "audio", "p", "h1", "h2", "h3",
    "h4", "h5", "h6", "figcaption", "blockquote", "pre", "li", "dt", "dd",
];

/// The result of one page pass.
#[derive(Debug)]
pub struct RenderedPage {
    pub fragment: PageFragment,
    /// Where the next page starts; `None` when the source is exhausted.
    pub break_token: Option<BreakTokens>,
}

impl RenderedPage {
    pub fn is_last(&self) -> bool {
        self.break_token.is_none()
    }
}

/// Whether `node` is cloned shallowly and walked into.
pub fn is_container(doc: &Document, node: NodeId) -> bool {
    let Some(tag) = doc.tag(node) else {
        return true;
    };
    if INLINE_TAGS.contains(&tag) || ATOMIC_TAGS.contains(&tag) {
        return false;
    }
    let hidden = doc
        .attr(node, attrs::STYLE)
        .map(InlineStyle::parse)
        .is_some_and(|s| s.get("display") == Some("none"));
    !hidden
}

fn is_forced_break(value: Option<&str>) -> bool {
    value.is_some_and(|v| FORCED_BREAKS.contains(&v))
}

fn has_content(doc: &Document, node: NodeId) -> bool {
    match doc.text(node) {
        Some(text) => !is_blank(text),
        None => true,
    }
}

/// The `data-page` in effect for `node`.
fn named_page(doc: &Document, node: NodeId) -> Option<&str> {
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .find_map(|n| doc.attr(n, attrs::PAGE))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\u{ad}'
}

/// Lays out pages of a source document against a geometry oracle.
pub struct Layout<O> {
    oracle: O,
    bounds: PageBounds,
    config: LayoutConfig,
    hooks: Hooks,
    assets: Box<dyn AssetLoader>,
}

impl<O: GeometryOracle> Layout<O> {
    pub fn new(oracle: O, bounds: PageBounds, config: LayoutConfig) -> Self {
        Self {
            oracle,
            bounds,
            config,
            hooks: Hooks::new(),
            assets: Box::new(ReadyAssets),
        }
    }

    pub fn with_assets<L>(mut self, loader: L) -> Self
    where
        L: AssetLoader + 'static,
    {
        self.assets = Box::new(loader);
        self
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn bounds(&self) -> &PageBounds {
        &self.bounds
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    /// Lays out one page starting at `start`, or at the beginning of the
    /// source when `start` is `None`.
    pub async fn render_page(
        &mut self,
        source: &SourceTree,
        start: Option<&BreakTokens>,
    ) -> Result<RenderedPage, LayoutError> {
        let mut page = PageFragment::new(source);
        let first = match start.and_then(|t| t.first()) {
            Some(token) => Some(token.node),
            None => source.first_child(source.root()),
        };
        let Some(start_node) = first else {
            return Ok(RenderedPage {
                fragment: page,
                break_token: None,
            });
        };

        let start_tokens: Vec<BreakToken> = start.map(|t| t.as_slice().to_vec()).unwrap_or_default();
        let mut pending: Vec<(NodeId, BreakToken)> = start_tokens
            .iter()
            .skip(1)
            .filter_map(|t| source.closest(t.node, CELL_TAGS).map(|cell| (cell, *t)))
            .collect();
        let prev = start
            .cloned()
            .unwrap_or_else(|| BreakTokens::One(BreakToken::at(start_node)));
        log::debug!("Rendering page from {}", prev);

        self.hooks.page_layout(&mut page, start);
        if let Some(name) = source.ancestors(start_node).find_map(|n| source.attr(n, attrs::PAGE)) {
            page.set_named_page(name, false);
        }

        let mut cursor = TreeCursor::new(source, start_node, None);
        let mut length = 0;
        let mut rendered_content = false;
        let mut last_node = start_node;
        let mut break_token = None;

        loop {
            let Some(node) = cursor.next() else {
                self.before_check(&mut page).await;
                let found = self.find_break_token(source, &mut page, &prev)?;
                break_token = self.settle(source, &mut page, found, &prev, last_node)?;
                break;
            };

            if let Some(i) = pending.iter().position(|(cell, _)| *cell == node) {
                let (_, token) = pending.remove(i);
                if token.node != node {
                    log::trace!("Resuming column {} at {}", node, token);
                    cursor.reseed(token.node);
                    continue;
                }
            }
            last_node = node;

            let mut control = LayoutControl::default();
            self.hooks.layout_node(source, node, &mut control);

            let forced = control.is_forced() && rendered_content;
            if forced || (rendered_content && self.should_break(source, node, start_node)) {
                log::debug!("Break before {}{}", node, if forced { " (forced)" } else { "" });
                self.before_check(&mut page).await;
                let found = match self.find_break_token(source, &mut page, &prev)? {
                    Some(tokens) => Some(tokens),
                    None => self.break_at(&page, node),
                };
                break_token = self.settle(source, &mut page, found, &prev, node)?;
                break;
            }

            if let Some(name) = source.attr(node, attrs::PAGE) {
                let first = source.attr(node, attrs::SPLIT_FROM).is_none();
                page.set_named_page(name, first);
            }

            let deep = !is_container(source, node);
            let clone = self.append(source, &mut page, node, deep, &start_tokens)?;
            if deep {
                cursor.skip_subtree(node);
            }
            length += page.text_content(clone).chars().count();
            rendered_content |= has_content(source, node);

            if length >= self.config.max_chars {
                log::debug!("Checking page after {} characters", length);
                self.before_check(&mut page).await;
                if let Some(cell) = table::enclosing_cell(source, node, source.root()) {
                    let quick = find_overflow(&self.oracle, source, &mut page, &self.bounds, Some(&prev), true)?;
                    if quick.is_some() {
                        let last = self.complete_columns(source, &mut page, node, cell, &start_tokens, &mut pending)?;
                        cursor.skip_subtree(last);
                    }
                }
                length = 0;
                if let Some(found) = self.find_break_token(source, &mut page, &prev)? {
                    break_token = self.settle(source, &mut page, Some(found), &prev, node)?;
                    break;
                }
            }
        }

        self.hooks.render_result(break_token.as_ref(), &mut page);
        match &break_token {
            Some(tokens) => log::debug!("Page ends; next page starts at {}", tokens),
            None => log::debug!("Page ends; source exhausted"),
        }
        Ok(RenderedPage {
            fragment: page,
            break_token,
        })
    }

    async fn before_check(&mut self, page: &mut PageFragment) {
        self.hooks.layout(page, &self.bounds);
        wait_for_images(self.assets.as_ref(), page).await;
    }

    /// Whether a break directive separates `node` from the content before it.
    fn should_break(&self, source: &SourceTree, node: NodeId, start: NodeId) -> bool {
        let previous = node_before(source, node, Some(start));
        let before = source.attr(node, attrs::BREAK_BEFORE);
        let doubled = is_forced_break(before)
            && previous.is_none()
            && source
                .parent(node)
                .is_some_and(|p| source.attr(p, attrs::BREAK_BEFORE) == before);

        let page_change = match previous {
            Some(previous) if has_content(source, node) => {
                named_page(source, node) != named_page(source, previous)
            }
            _ => false,
        };

        (is_forced_break(before) && !doubled)
            || is_forced_break(source.attr(node, attrs::PREVIOUS_BREAK_AFTER))
            || page_change
    }

    /// A token at the start of `node`, after the break-token hooks.
    fn break_at(&mut self, page: &PageFragment, node: NodeId) -> Option<BreakTokens> {
        let token = BreakTokens::One(BreakToken::at(node));
        self.hooks.break_token(Some(token), None, page)
    }

    /// Finds the overflow of `page`, maps it to break tokens and removes the
    /// overflowing content, unless the tokens repeat `prev`.
    pub fn find_break_token(
        &mut self,
        source: &SourceTree,
        page: &mut PageFragment,
        prev: &BreakTokens,
    ) -> Result<Option<BreakTokens>, LayoutError> {
        let overflow = find_overflow(&self.oracle, source, page, &self.bounds, Some(prev), false)?;
        let Some(overflow) = self.hooks.overflow(overflow, page) else {
            return Ok(None);
        };

        let tokens = build_tokens(source, page, &overflow);
        let Some(tokens) = self.hooks.break_token(tokens, Some(&overflow), page) else {
            return Ok(None);
        };
        if tokens == *prev {
            return Ok(Some(tokens));
        }

        let mut removed = Vec::with_capacity(overflow.len());
        for region in &overflow {
            let extracted = region::extract(page.document_mut(), region)?;
            self.hyphenate(page, region, &extracted);
            removed.push(extracted);
        }
        self.hooks.overflow_removed(&removed, page);
        Ok(Some(tokens))
    }

    /// Appends the hyphen glyph when the break splits a word.
    fn hyphenate(&self, page: &mut PageFragment, region: &OverflowRegion, extracted: &Extracted) {
        if !self.config.hyphenate {
            return;
        }
        let Boundary::Text { node, offset } = region.start else {
            return;
        };
        if offset == 0 {
            return;
        }
        let Some(kept) = page.document().text(node) else {
            return;
        };
        let before = kept.chars().last();
        let after = extracted
            .nodes
            .first()
            .filter(|&&n| page.origin(n) == page.origin(node))
            .and_then(|&n| page.document().text(n))
            .and_then(|t| t.chars().next());
        if before.is_some_and(is_word_char) && after.is_some_and(is_word_char) {
            let hyphenated = format!("{}{}", kept, self.config.hyphen_glyph);
            let doc = page.document_mut();
            doc.set_text(node, hyphenated);
            if let Some(parent) = doc.parent(node) {
                doc.add_class(parent, classes::HYPHEN);
            }
        }
    }

    /// Accepts `found`, or moves past content that cannot fit an empty page.
    fn settle(
        &mut self,
        source: &SourceTree,
        page: &mut PageFragment,
        found: Option<BreakTokens>,
        prev: &BreakTokens,
        node: NodeId,
    ) -> Result<Option<BreakTokens>, LayoutError> {
        let Some(tokens) = found else {
            return Ok(None);
        };
        if tokens != *prev {
            return Ok(Some(tokens));
        }

        let stuck = match &tokens {
            BreakTokens::One(token) => Some(token.node),
            BreakTokens::Many(list) => list
                .first()
                .and_then(|t| source.closest(t.node, &["tr"])),
        };
        let Some(after) = stuck.and_then(|n| node_after(source, n, None)) else {
            self.hooks.render_result(None, page);
            return Err(OverflowContentError { nodes: vec![node] }.into());
        };
        log::warn!("Unable to lay out {} on an empty page; continuing at {}", tokens, after);

        if let Some(clone) = page.lookup(after) {
            let root = page.root();
            let end = page.last_child(root).unwrap_or(root);
            let removed = region::extract(page.document_mut(), &OverflowRegion::new(Boundary::Before(clone), end))?;
            self.hooks.overflow_removed(&[removed], page);
        }
        Ok(Some(BreakTokens::One(BreakToken::at(after))))
    }

    /// Clones `node` into the page under its parent's counterpart,
    /// rebuilding missing ancestors first.
    fn append(
        &mut self,
        source: &SourceTree,
        page: &mut PageFragment,
        node: NodeId,
        deep: bool,
        start_tokens: &[BreakToken],
    ) -> Result<NodeId, LayoutError> {
        let doc = page.document_mut();
        let clone = doc.import(source, node, deep);
        if let Some(token) = start_tokens.iter().find(|t| t.node == node && t.offset > 0) {
            if let Some(content) = source.text(node) {
                doc.set_text(clone, suffix(content, token.offset));
                doc.set_source_offset(clone, token.offset);
            }
        }

        let top = self.attach(source, page, node, clone)?;
        page.index_subtree(top);
        self.hooks.render_node(page, clone, node);
        Ok(clone)
    }

    /// Attaches `clone` at its source position; returns the topmost node
    /// that was newly attached.
    fn attach(
        &self,
        source: &SourceTree,
        page: &mut PageFragment,
        node: NodeId,
        clone: NodeId,
    ) -> Result<NodeId, LayoutError> {
        let mut child = clone;
        let mut current = source.parent(node);
        while let Some(ancestor) = current {
            if let Some(existing) = page.lookup(ancestor) {
                page.document_mut().append_child(existing, child)?;
                return Ok(child);
            }
            let doc = page.document_mut();
            let shell = doc.import(source, ancestor, false);
            if let Some(ref_id) = source.ref_id(ancestor) {
                doc.set_attr(shell, attrs::SPLIT_FROM, ref_id);
            }
            doc.append_child(shell, child)?;
            log::trace!("Rebuilt ancestor {} of {}", ancestor, node);
            child = shell;
            current = source.parent(ancestor);
        }
        let root = page.root();
        page.document_mut().append_child(root, child)?;
        Ok(child)
    }

    fn notify_layout_node(&mut self, source: &SourceTree, node: NodeId) {
        if self.hooks.registered(HookEvent::LayoutNode).is_empty() {
            return;
        }
        let mut control = LayoutControl::default();
        self.hooks.layout_node(source, node, &mut control);
    }

    /// Fills the rest of the row around `node` so every column can be
    /// measured: the rest of the current cell, then each following cell
    /// that is missing or empty. Returns the last cell of the row.
    fn complete_columns(
        &mut self,
        source: &SourceTree,
        page: &mut PageFragment,
        node: NodeId,
        cell: NodeId,
        start_tokens: &[BreakToken],
        pending: &mut Vec<(NodeId, BreakToken)>,
    ) -> Result<NodeId, LayoutError> {
        if source.is_element(node) && node != cell {
            for &child in source.children(node) {
                if page.lookup(child).is_none() {
                    self.append(source, page, child, true, start_tokens)?;
                }
            }
        }
        let mut level = node;
        while level != cell {
            let mut sibling = source.next_sibling(level);
            while let Some(s) = sibling {
                if page.lookup(s).is_none() {
                    self.notify_layout_node(source, s);
                    self.append(source, page, s, true, start_tokens)?;
                }
                sibling = source.next_sibling(s);
            }
            match source.parent(level) {
                Some(parent) => level = parent,
                None => break,
            }
        }

        let mut last = cell;
        for next_cell in table::following_cells(source, cell) {
            last = next_cell;
            let existing = page.lookup(next_cell);
            if existing.is_some_and(|c| table::cell_has_content(page.document(), c)) {
                continue;
            }

            if let Some(i) = pending.iter().position(|(c, _)| *c == next_cell) {
                let (_, token) = pending.remove(i);
                log::debug!("Completing column {} from {}", next_cell, token);
                let mut walk = TreeCursor::new(source, token.node, Some(next_cell));
                while let Some(n) = walk.next() {
                    if page.lookup(n).is_some() {
                        continue;
                    }
                    self.notify_layout_node(source, n);
                    self.append(source, page, n, false, start_tokens)?;
                }
            } else if let Some(existing) = existing {
                log::debug!("Refilling empty column {}", next_cell);
                for child in page.children(existing).to_vec() {
                    page.document_mut().detach(child)?;
                }
                for &child in source.children(next_cell) {
                    self.append(source, page, child, true, start_tokens)?;
                }
            } else {
                log::debug!("Duplicating column {}", next_cell);
                self.notify_layout_node(source, next_cell);
                let duplicate = self.append(source, page, next_cell, true, start_tokens)?;
                page.document_mut().add_class(duplicate, classes::ADDED);
            }
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{build_source, el, el_with, para, text};

    #[test]
    fn test_containers_and_atomic_content() {
        let source = build_source(vec![
            el("div", vec![para("x")]),
            el("section", vec![el("span", vec![text("y")])]),
            el_with("div", &[("style", "display: none")], vec![]),
        ]);
        let div = source.first_child(source.root()).unwrap();
        let p = source.first_child(div).unwrap();
        let section = source.next_sibling(div).unwrap();
        let span = source.first_child(section).unwrap();
        let hidden = source.last_child(source.root()).unwrap();

        assert!(is_container(&source, div));
        assert!(is_container(&source, section));
        assert!(!is_container(&source, p));
        assert!(!is_container(&source, span));
        assert!(!is_container(&source, hidden));
        assert!(is_container(&source, source.first_child(span).unwrap()));
    }

    #[test]
    fn test_word_chars_include_soft_hyphen() {
        assert!(is_word_char('a'));
        assert!(is_word_char('_'));
        assert!(is_word_char('\u{ad}'));
        assert!(!is_word_char(' '));
        assert!(!is_word_char('-'));
    }
}
