//! Locating the first content that does not fit the page box.
//!
//! The scan walks the fragment in document order with a [`TreeCursor`] and
//! keeps all of its state local; nothing is written to the fragment until
//! the table columns are finalized.

use crate::fragment::PageFragment;
use crate::oracle::GeometryOracle;
use crate::region::{Boundary, Overflow, OverflowRegion};
use crate::text_break::{Edges, text_break};
use crate::token::BreakTokens;
use quire_dom::cursor::first_significant_child;
use quire_dom::table;
use quire_dom::{Document, DomError, SourceTree, TreeCursor, attrs, classes, node_before};
use quire_types::{NodeId, PageBounds, Rect};
use std::collections::HashMap;

const AVOID: &str = "avoid";

/// Whether the fragment's content is larger than the page box.
pub fn has_overflow<O>(oracle: &O, page: &PageFragment, bounds: &PageBounds) -> bool
where
    O: GeometryOracle + ?Sized,
{
    let doc = page.document();
    let root = doc.root();
    let children = Rect::union_all(doc.children(root).iter().filter_map(|&c| oracle.rect(doc, c)));
    let (mut width, mut height) = match children {
        Some(r) => (
            (r.right - bounds.rect.left).floor(),
            (r.bottom - bounds.rect.top).floor(),
        ),
        None => (0.0, 0.0),
    };
    let scroll = oracle.scroll_extent(doc);
    width = width.max(scroll.width.floor());
    height = height.max(scroll.height.floor());
    width > (bounds.width() + bounds.column_gap).round() || height > bounds.height().round()
}

/// Finds the content of `page` that must move to the next page.
///
/// Returns one region, or one region per table column when cells of the
/// same rows overflow separately. With `quit_on_first` the first region
/// found is returned as is and the fragment is left untouched.
pub fn find_overflow<O>(
    oracle: &O,
    source: &SourceTree,
    page: &mut PageFragment,
    bounds: &PageBounds,
    prev: Option<&BreakTokens>,
    quit_on_first: bool,
) -> Result<Option<Overflow>, DomError>
where
    O: GeometryOracle + ?Sized,
{
    if !has_overflow(oracle, page, bounds) {
        return Ok(None);
    }

    let scan = Scan {
        oracle,
        source,
        page: &*page,
        edges: Edges {
            h_end: bounds.h_end(),
            v_end: bounds.v_end(),
        },
    };
    let Some(found) = scan.run(quit_on_first) else {
        return Ok(None);
    };

    let root = page.root();
    let end_of_page = page.last_child(root).unwrap_or(root);
    match found {
        Found::Single(mut region) => {
            region.end = end_of_page;
            log::debug!("Overflow at {:?}", region.start);
            Ok(Some(Overflow::One(region)))
        }
        Found::Columns(mut regions) if quit_on_first => {
            regions.truncate(1);
            Ok(Overflow::from_vec(regions))
        }
        Found::Columns(regions) => {
            log::debug!("Overflow in {} table columns", regions.len());
            finish_columns(source, page, regions, prev)
        }
    }
}

enum Found {
    Single(OverflowRegion),
    Columns(Vec<OverflowRegion>),
}

struct Scan<'a, O: ?Sized> {
    oracle: &'a O,
    source: &'a SourceTree,
    page: &'a PageFragment,
    edges: Edges,
}

/// Where a scan step lands.
struct Candidate {
    start: Boundary,
    /// The candidate was promoted to a break-avoiding text ancestor; such
    /// regions never continue in the next column.
    avoided: bool,
}

impl<O: GeometryOracle + ?Sized> Scan<'_, O> {
    fn doc(&self) -> &Document {
        self.page.document()
    }

    fn run(&self, quit_on_first: bool) -> Option<Found> {
        let doc = self.doc();
        let root = doc.root();
        let mut cursor = TreeCursor::new(doc, doc.first_child(root)?, Some(root));
        let mut columns: Vec<OverflowRegion> = Vec::new();

        while let Some(node) = cursor.next() {
            let Some(rect) = self.oracle.rect(doc, node) else {
                continue;
            };
            let left = rect.left.round();
            let top = rect.top.round();
            let right = rect.right.floor();
            let bottom = rect.bottom.floor();
            let starts_outside = left >= self.edges.h_end || top >= self.edges.v_end;

            let mut skip = false;
            let mut candidate = None;
            if starts_outside {
                candidate = self.positioned_candidate(node, &mut skip);
            } else if self.is_straddling_leaf(node, right, bottom) {
                candidate = Some(self.promote(node));
            }
            if candidate.is_none() && !skip && self.is_text_with_content(node) {
                candidate = self.text_candidate(node);
            }

            if let Some(candidate) = candidate {
                let region = OverflowRegion::new(candidate.start, candidate.start.node());
                let in_cell = table::enclosing_cell(doc, node, root).is_some();
                let next = if in_cell && !candidate.avoided {
                    self.next_column(candidate.start.node())
                } else {
                    None
                };
                match next {
                    Some(next) => {
                        log::trace!("Column overflow at {:?}, continuing at {}", region.start, next);
                        columns.push(region);
                        if quit_on_first {
                            return Some(Found::Columns(columns));
                        }
                        cursor.reseed(next);
                        continue;
                    }
                    None if in_cell && !candidate.avoided && !columns.is_empty() => {
                        columns.push(region);
                        return Some(Found::Columns(columns));
                    }
                    None if !columns.is_empty() => return Some(Found::Columns(columns)),
                    None => return Some(Found::Single(region)),
                }
            }

            if skip
                || (right <= self.edges.h_end
                    && bottom <= self.edges.v_end
                    && !self.has_tall_spanning_cell(node))
            {
                cursor.skip_subtree(node);
            }
        }

        if columns.is_empty() {
            None
        } else {
            Some(Found::Columns(columns))
        }
    }

    /// Applies break-avoidance precedence to a node that starts past an edge.
    fn positioned_candidate(&self, node: NodeId, skip: &mut bool) -> Option<Candidate> {
        let doc = self.doc();
        let root = doc.root();
        let cell = table::enclosing_cell(doc, node, root);

        let mut anchor = None;
        let mut is_br = false;
        let mut is_float = false;
        if let Some(cell) = cell.filter(|&c| self.avoids_break_inside(c)) {
            anchor = doc.parent(cell);
        } else if doc.is_element(node) {
            let style = self.oracle.computed_style(doc, node);
            is_float = style.is_floated();
            *skip = style.avoids_break_inside() || is_float;
            let break_avoid = doc.attr(node, attrs::BREAK_BEFORE) == Some(AVOID)
                || doc.attr(node, attrs::PREVIOUS_BREAK_AFTER) == Some(AVOID);
            if break_avoid {
                anchor = node_before(doc, node, Some(root));
            }
            is_br = doc.has_tag(node, "br") || doc.has_tag(node, "wbr");
        }

        let row = if table::is_row(doc, node) {
            Some(node)
        } else {
            table::enclosing_row(doc, node, root)
        };
        if let Some(group) = row.and_then(|r| doc.parent(r)) {
            let is_group = doc.has_tag(group, "tbody") || doc.has_tag(group, "thead");
            if is_group && self.avoids_break_inside(group) {
                anchor = Some(group);
            }
        }

        if let Some(anchor) = anchor {
            return Some(Candidate {
                start: Boundary::Before(anchor),
                avoided: false,
            });
        }
        if is_float {
            return None;
        }
        if doc.is_element(node) && !is_br {
            return Some(self.promote(node));
        }
        if self.is_text_with_content(node) {
            return Some(Candidate {
                start: Boundary::Before(node),
                avoided: false,
            });
        }
        None
    }

    /// An element that cannot be split further and crosses an edge.
    fn is_straddling_leaf(&self, node: NodeId, right: f32, bottom: f32) -> bool {
        let doc = self.doc();
        doc.is_element(node)
            && doc.children(node).is_empty()
            && !doc.has_tag(node, "br")
            && !doc.has_tag(node, "wbr")
            && (right > self.edges.h_end || bottom > self.edges.v_end)
            && !self.oracle.computed_style(doc, node).is_floated()
    }

    /// Moves an element candidate out to its break-avoiding ancestor.
    fn promote(&self, node: NodeId) -> Candidate {
        match self.avoiding_ancestor(node) {
            Some(anchor) => Candidate {
                start: Boundary::Before(anchor),
                avoided: true,
            },
            None => Candidate {
                start: Boundary::Before(node),
                avoided: false,
            },
        }
    }

    fn text_candidate(&self, node: NodeId) -> Option<Candidate> {
        let doc = self.doc();
        let (mut left, mut right, mut top, mut bottom) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
        for r in self.oracle.client_rects(doc, node) {
            if r.width() > 0.0 {
                left = left.max(r.left);
                right = right.max(r.right);
            }
            if r.height() > 0.0 {
                top = top.max(r.top);
                bottom = bottom.max(r.bottom);
            }
        }
        let Edges { h_end, v_end } = self.edges;
        if left < h_end && right < h_end && top < v_end && bottom < v_end {
            return None;
        }

        if let Some(anchor) = self.avoiding_ancestor(node) {
            return Some(Candidate {
                start: Boundary::Before(anchor),
                avoided: true,
            });
        }
        let start = match text_break(self.oracle, doc, node, self.edges)? {
            0 => Boundary::Before(node),
            offset => Boundary::Text { node, offset },
        };
        Some(Candidate {
            start,
            avoided: false,
        })
    }

    /// Nearest proper ancestor that avoids breaks inside; a cell stands
    /// for its whole row.
    fn avoiding_ancestor(&self, node: NodeId) -> Option<NodeId> {
        let doc = self.doc();
        let root = doc.root();
        let found = doc
            .ancestors(node)
            .take_while(|&a| a != root)
            .find(|&a| self.avoids_break_inside(a))?;
        if table::is_cell(doc, found) {
            doc.parent(found)
        } else {
            Some(found)
        }
    }

    fn avoids_break_inside(&self, node: NodeId) -> bool {
        let doc = self.doc();
        doc.attr(node, "data-break-inside") == Some(AVOID)
            || self.oracle.computed_style(doc, node).avoids_break_inside()
    }

    fn is_text_with_content(&self, node: NodeId) -> bool {
        self.doc()
            .text(node)
            .is_some_and(|t| !quire_dom::text::is_blank(t))
    }

    /// A row whose rowspanning cell reaches past the bottom edge.
    fn has_tall_spanning_cell(&self, node: NodeId) -> bool {
        let doc = self.doc();
        table::is_row(doc, node)
            && table::row_cells(doc, node)
                .into_iter()
                .filter(|&c| table::is_spanning(doc, c))
                .filter_map(|c| self.oracle.rect(doc, c))
                .any(|r| r.bottom.round() >= self.edges.v_end)
    }

    /// The rendered counterpart of the next source cell with content after
    /// the cell holding `anchor`.
    fn next_column(&self, anchor: NodeId) -> Option<NodeId> {
        let doc = self.doc();
        let cell = table::enclosing_cell(doc, anchor, doc.root())?;
        let source_cell = doc.origin(cell)?;
        let source_next = table::next_cell_with_content(self.source, source_cell)?;
        self.page.lookup(source_next)
    }
}

fn cell_of(doc: &Document, start: &Boundary) -> Option<NodeId> {
    let root = doc.root();
    let container = match *start {
        Boundary::Before(node) => doc.parent(node)?,
        Boundary::Text { node, .. } => node,
    };
    table::enclosing_cell(doc, container, root)
}

/// Gives every cell of the broken rows its own region, orders regions by
/// column and stretches each one to the end of its cell.
fn finish_columns(
    source: &SourceTree,
    page: &mut PageFragment,
    mut regions: Vec<OverflowRegion>,
    prev: Option<&BreakTokens>,
) -> Result<Option<Overflow>, DomError> {
    let root = page.root();
    for cell in unbroken_cells(source, page, &regions, prev) {
        let Some(marker) = ensure_cell_end(source, page, cell)? else {
            log::warn!("Cell {} has no end marker to break at.", cell);
            continue;
        };
        regions.push(OverflowRegion::new(Boundary::Before(marker), marker));
    }

    let position: HashMap<NodeId, usize> = page
        .descendants(root)
        .enumerate()
        .map(|(i, n)| (n, i))
        .collect();
    regions.sort_by_key(|r| position.get(&r.start.node()).copied().unwrap_or(usize::MAX));

    for region in regions.iter_mut() {
        let Some(cell) = cell_of(page.document(), &region.start) else {
            continue;
        };
        if let Boundary::Before(node) = region.start {
            if starts_cell(page.document(), node, cell) {
                if let Some(first) = page.first_child(cell) {
                    region.start = Boundary::Before(first);
                }
                page.document_mut().add_class(cell, classes::EMPTY_CELL);
            }
        }
        region.end = cell_end(page.document(), cell);
    }

    if let Some(last) = regions.last_mut() {
        last.end = page.last_child(root).unwrap_or(root);
    }
    Ok(Overflow::from_vec(regions))
}

/// Cells of the rows broken on this page, or on the previous one, that
/// have no region of their own yet.
fn unbroken_cells(
    source: &SourceTree,
    page: &PageFragment,
    regions: &[OverflowRegion],
    prev: Option<&BreakTokens>,
) -> Vec<NodeId> {
    let doc = page.document();
    let root = doc.root();
    let Some(first_cell) = regions.first().and_then(|r| cell_of(doc, &r.start)) else {
        return Vec::new();
    };
    let table_node = doc.closest(first_cell, &["table"]);

    let mut rows: Vec<NodeId> = regions
        .iter()
        .filter_map(|r| doc.closest_within(r.start.node(), &["tr"], root))
        .collect();
    if let Some(prev) = prev {
        for token in prev {
            let source_row = source.closest(token.node, &["tr"]);
            let row = source_row.and_then(|r| page.lookup(r));
            rows.extend(row);
        }
    }

    doc.descendants(root)
        .skip_while(|&n| n != first_cell)
        .filter(|&n| table::is_cell(doc, n) && doc.closest(n, &["table"]) == table_node)
        .filter(|&n| doc.parent(n).is_some_and(|row| rows.contains(&row)))
        .filter(|&n| !regions.iter().any(|r| cell_of(doc, &r.start) == Some(n)))
        .collect()
}

/// The last child of `cell`, or of the enclosing cells it closes.
fn cell_end(doc: &Document, cell: NodeId) -> NodeId {
    let root = doc.root();
    let mut end = doc.last_child(cell).unwrap_or(cell);
    let mut current = cell;
    while table::is_last_cell(doc, current) {
        let outer = doc
            .parent(current)
            .and_then(|p| table::enclosing_cell(doc, p, root));
        let Some(outer) = outer else {
            break;
        };
        if let Some(last) = doc.last_child(outer) {
            end = last;
        }
        current = outer;
    }
    end
}

/// Whether nothing significant precedes `node` inside `cell`.
fn starts_cell(doc: &Document, node: NodeId, cell: NodeId) -> bool {
    let mut current = node;
    while current != cell {
        let Some(parent) = doc.parent(current) else {
            return false;
        };
        if first_significant_child(doc, parent) != Some(current) {
            return false;
        }
        current = parent;
    }
    true
}

/// The fragment cell's end marker, cloned in from the source cell when the
/// page does not hold it yet.
fn ensure_cell_end(
    source: &SourceTree,
    page: &mut PageFragment,
    cell: NodeId,
) -> Result<Option<NodeId>, DomError> {
    if table::has_cell_end(page, cell) {
        return Ok(page.last_child(cell));
    }
    let source_marker = page
        .origin(cell)
        .and_then(|c| source.last_child(c))
        .filter(|&m| table::is_cell_end_marker(source, m));
    let Some(source_marker) = source_marker else {
        return Ok(None);
    };
    let marker = page.document_mut().import(source, source_marker, true);
    page.document_mut().append_child(cell, marker)?;
    page.index_subtree(marker);
    Ok(Some(marker))
}
