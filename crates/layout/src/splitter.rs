//! Structural repair of tables after a page has been laid out.
//!
//! Column-wise splitting leaves artifacts behind: duplicated cells, rows
//! that ended up empty on one page and repeated on the next, rowspanning
//! cells whose first rows are exhausted and the end-of-cell markers. This
//! pass cleans them up once per page, in that order.

use crate::fragment::PageFragment;
use crate::token::BreakTokens;
use quire_dom::table::{self, ROW_GROUP_TAGS};
use quire_dom::{Document, DomError, SourceTree, attrs, classes};
use quire_types::{NodeId, RefId};
use std::collections::HashSet;

/// Where a table stands at the end of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSplit {
    /// Started and finished on this page.
    Unbroken,
    /// The next page continues inside the table.
    Splitting,
    /// Continued from the previous page and split again for the next one.
    Continuing,
    /// Continued from the previous page and finished here.
    Resuming,
}

impl TableSplit {
    /// The state of the page's clone `table`, given the tokens that start
    /// the next page.
    pub fn of(source: &SourceTree, page: &PageFragment, table: NodeId, next: Option<&BreakTokens>) -> Self {
        let splitting = match (page.origin(table), next) {
            (Some(origin), Some(tokens)) => tokens.iter().any(|t| source.contains(origin, t.node)),
            _ => false,
        };
        match (is_resumed(page, table), splitting) {
            (false, false) => TableSplit::Unbroken,
            (false, true) => TableSplit::Splitting,
            (true, true) => TableSplit::Continuing,
            (true, false) => TableSplit::Resuming,
        }
    }

    /// The table picks up rows the previous page started.
    pub fn continues_previous(self) -> bool {
        matches!(self, TableSplit::Continuing | TableSplit::Resuming)
    }
}

/// A table rebuilt as the ancestor of content resumed on this page.
fn is_resumed(doc: &Document, table: NodeId) -> bool {
    doc.attr(table, attrs::SPLIT_FROM).is_some()
}

fn tables(doc: &Document) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .filter(|&n| doc.has_tag(n, "table"))
        .collect()
}

/// Runs every repair on `current`, and on the trailing rows of `previous`.
pub fn after_page_layout(
    source: &SourceTree,
    previous: Option<&mut PageFragment>,
    current: &mut PageFragment,
    next: Option<&BreakTokens>,
) -> Result<(), DomError> {
    drop_added_duplicates(current)?;

    for table in tables(current) {
        let state = TableSplit::of(source, current, table, next);
        log::debug!("Table {} is {:?}", table, state);
        if state.continues_previous() {
            migrate_spanning_cells(current, table)?;
        }
    }

    if let Some(previous) = previous {
        remove_repeated_empty_rows(previous, current)?;
    }

    remove_cell_markers(current)?;

    if ends_with_table(current) {
        let root = current.root();
        current
            .document_mut()
            .set_attr(root, attrs::COLUMN_WIDTH, "auto");
    }
    Ok(())
}

/// Removes cells duplicated to complete a row when the real cell made it
/// onto the page as well.
fn drop_added_duplicates(page: &mut PageFragment) -> Result<(), DomError> {
    let doc = page.document();
    let cells: Vec<NodeId> = doc
        .descendants(doc.root())
        .filter(|&n| table::is_cell(doc, n))
        .collect();
    let resident: HashSet<RefId> = cells
        .iter()
        .filter(|&&c| !doc.has_class(c, classes::ADDED))
        .filter_map(|&c| doc.ref_id(c).map(RefId::from))
        .collect();
    let duplicates: Vec<NodeId> = cells
        .into_iter()
        .filter(|&c| doc.has_class(c, classes::ADDED))
        .filter(|&c| {
            doc.ref_id(c)
                .is_some_and(|r| resident.contains(&RefId::from(r)))
        })
        .collect();
    for cell in duplicates {
        log::debug!("Dropping duplicated cell {}", cell);
        page.document_mut().detach(cell)?;
    }
    Ok(())
}

fn is_empty_row(doc: &Document, row: NodeId) -> bool {
    table::row_cells(doc, row)
        .into_iter()
        .all(|cell| !table::cell_has_content(doc, cell))
}

/// Drops rows at the end of the previous page's tables that are empty and
/// reappear on this page. Row groups and tables left without rows go too.
fn remove_repeated_empty_rows(previous: &mut PageFragment, current: &PageFragment) -> Result<(), DomError> {
    for table in tables(previous) {
        let rows = table::table_rows(previous, table);
        for &row in rows.iter().rev() {
            let repeated = previous
                .origin(row)
                .is_some_and(|origin| current.lookup(origin).is_some());
            if !repeated || !is_empty_row(previous, row) {
                break;
            }
            log::debug!("Removing empty row {} repeated on the next page", row);
            let parent = previous.parent(row);
            previous.document_mut().detach(row)?;

            if let Some(group) = parent.filter(|&p| is_row_group(previous, p)) {
                if previous.element_children(group).next().is_none() {
                    previous.document_mut().detach(group)?;
                }
            }
        }
        if table::table_rows(previous, table).is_empty() && previous.is_attached(table) {
            log::debug!("Removing table {} left without rows", table);
            previous.document_mut().detach(table)?;
        }
    }
    Ok(())
}

fn is_row_group(doc: &Document, node: NodeId) -> bool {
    doc.tag(node).is_some_and(|t| ROW_GROUP_TAGS.contains(&t))
}

/// Moves rowspanning cells out of leading rows whose other cells are
/// exhausted, into the following row with the span shortened by one.
fn migrate_spanning_cells(page: &mut PageFragment, table: NodeId) -> Result<(), DomError> {
    loop {
        let Some(&row) = table::table_rows(page, table).first() else {
            return Ok(());
        };
        let Some(next_row) = page.next_sibling(row).filter(|&n| table::is_row(page, n)) else {
            return Ok(());
        };
        let cells = table::row_cells(page, row);
        let (spanning, single): (Vec<NodeId>, Vec<NodeId>) =
            cells.into_iter().partition(|&c| table::is_spanning(page, c));
        let exhausted = single.iter().all(|&c| !table::cell_has_content(page, c));
        if spanning.is_empty() || !exhausted {
            return Ok(());
        }

        for cell in spanning {
            let span = page
                .element(cell)
                .and_then(|el| el.usize_attr(attrs::ROWSPAN))
                .unwrap_or(1);
            let column = x_start(page, cell);
            let index = table::row_cells(page, next_row)
                .into_iter()
                .find(|&c| x_start(page, c) > column)
                .and_then(|c| page.index_in_parent(c))
                .unwrap_or(page.children(next_row).len());

            let y_start = page
                .element(cell)
                .and_then(|el| el.usize_attr(attrs::Y_START));
            let doc = page.document_mut();
            doc.detach(cell)?;
            doc.insert_child(next_row, index, cell)?;
            doc.set_attr(cell, attrs::ROWSPAN, (span - 1).to_string());
            if let Some(y) = y_start {
                doc.set_attr(cell, attrs::Y_START, (y + 1).to_string());
            }
            log::debug!("Moved spanning cell {} into row {} (rowspan {})", cell, next_row, span - 1);
        }
        page.document_mut().detach(row)?;
    }
}

fn x_start(doc: &Document, cell: NodeId) -> usize {
    doc.element(cell)
        .and_then(|el| el.usize_attr(attrs::X_START))
        .unwrap_or(0)
}

fn remove_cell_markers(page: &mut PageFragment) -> Result<(), DomError> {
    let doc = page.document();
    let markers: Vec<NodeId> = doc
        .descendants(doc.root())
        .filter(|&n| table::is_cell_end_marker(doc, n))
        .collect();
    for marker in markers {
        page.document_mut().detach(marker)?;
    }
    Ok(())
}

/// Whether the last block of the page, looking through wrapper `div`s
/// and `section`s, is a table.
fn ends_with_table(doc: &Document) -> bool {
    let mut current = doc.root();
    while let Some(last) = doc.element_children(current).last() {
        if doc.has_tag(last, "table") {
            return true;
        }
        if !doc.has_tag(last, "div") && !doc.has_tag(last, "section") {
            return false;
        }
        current = last;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{build_source, clone_of, el, el_with, full_page, nth, para, text};
    use crate::token::BreakToken;

    fn mark_resumed(page: &mut PageFragment, table: NodeId) {
        page.document_mut().set_attr(table, attrs::SPLIT_FROM, "r1");
    }

    fn empty_cell(page: &mut PageFragment, cell: NodeId) {
        for child in page.children(cell).to_vec() {
            if !table::is_cell_end_marker(page, child) {
                page.document_mut().detach(child).unwrap();
            }
        }
    }

    #[test]
    fn test_markers_removed_and_trailing_table_relaxes_width() {
        let source = build_source(vec![
            para("intro"),
            el("table", vec![el("tr", vec![el("td", vec![text("a")])])]),
        ]);
        let mut page = full_page(&source);

        after_page_layout(&source, None, &mut page, None).unwrap();
        let td = clone_of(&page, nth(&source, "td", 0));
        assert_eq!(page.children(td).len(), 1);
        assert!(!page.descendants(page.root()).any(|n| table::is_cell_end_marker(&page, n)));
        assert_eq!(page.attr(page.root(), attrs::COLUMN_WIDTH), Some("auto"));
    }

    #[test]
    fn test_trailing_paragraph_keeps_width() {
        let source = build_source(vec![
            el("table", vec![el("tr", vec![el("td", vec![text("a")])])]),
            para("outro"),
        ]);
        let mut page = full_page(&source);
        after_page_layout(&source, None, &mut page, None).unwrap();
        assert_eq!(page.attr(page.root(), attrs::COLUMN_WIDTH), None);
    }

    #[test]
    fn test_added_cell_dropped_when_real_cell_present() {
        let source = build_source(vec![el(
            "table",
            vec![el("tr", vec![el("td", vec![text("a")]), el("td", vec![text("b")])])],
        )]);
        let mut page = full_page(&source);
        let td2 = nth(&source, "td", 1);
        let row = clone_of(&page, nth(&source, "tr", 0));
        let duplicate = page.document_mut().import(&source, td2, true);
        page.document_mut().add_class(duplicate, classes::ADDED);
        page.document_mut().append_child(row, duplicate).unwrap();

        drop_added_duplicates(&mut page).unwrap();
        assert_eq!(table::row_cells(&page, row).len(), 2);
        assert!(!page.is_attached(duplicate));
    }

    #[test]
    fn test_repeated_empty_rows_leave_previous_page() {
        let source = build_source(vec![el(
            "table",
            vec![el(
                "tbody",
                vec![
                    el("tr", vec![el("td", vec![text("a")])]),
                    el("tr", vec![el("td", vec![text("b")])]),
                ],
            )],
        )]);
        let mut previous = full_page(&source);
        let mut current = full_page(&source);
        let prev_td2 = clone_of(&previous, nth(&source, "td", 1));
        empty_cell(&mut previous, prev_td2);
        let table = clone_of(&current, nth(&source, "table", 0));
        mark_resumed(&mut current, table);

        after_page_layout(&source, Some(&mut previous), &mut current, None).unwrap();
        let prev_table = clone_of(&previous, nth(&source, "table", 0));
        assert_eq!(table::table_rows(&previous, prev_table).len(), 1);
        assert!(previous.lookup(nth(&source, "tr", 1)).is_none());
    }

    #[test]
    fn test_table_of_only_repeated_empty_rows_is_removed() {
        let source = build_source(vec![
            para("before"),
            el("table", vec![el("tr", vec![el("td", vec![text("a")])])]),
        ]);
        let mut previous = full_page(&source);
        let mut current = full_page(&source);
        let prev_td = clone_of(&previous, nth(&source, "td", 0));
        empty_cell(&mut previous, prev_td);

        after_page_layout(&source, Some(&mut previous), &mut current, None).unwrap();
        assert!(previous.lookup(nth(&source, "table", 0)).is_none());
        assert!(previous.lookup(nth(&source, "p", 0)).is_some());
    }

    #[test]
    fn test_rowspanning_cell_moves_into_next_row() {
        let source = build_source(vec![el(
            "table",
            vec![
                el(
                    "tr",
                    vec![
                        el_with("td", &[("rowspan", "3")], vec![text("tall")]),
                        el("td", vec![text("a")]),
                    ],
                ),
                el("tr", vec![el("td", vec![text("b")])]),
                el("tr", vec![el("td", vec![text("c")])]),
            ],
        )]);
        let mut page = full_page(&source);
        let table = clone_of(&page, nth(&source, "table", 0));
        mark_resumed(&mut page, table);
        let a = clone_of(&page, nth(&source, "td", 1));
        empty_cell(&mut page, a);
        let tall = clone_of(&page, nth(&source, "td", 0));

        after_page_layout(&source, None, &mut page, None).unwrap();
        let rows = table::table_rows(&page, table);
        assert_eq!(rows.len(), 2);
        assert_eq!(table::row_cells(&page, rows[0])[0], tall);
        assert_eq!(page.attr(tall, attrs::ROWSPAN), Some("2"));
        assert_eq!(page.attr(tall, attrs::Y_START), Some("1"));
        assert!(previous_row_gone(&page, &source));
    }

    fn previous_row_gone(page: &PageFragment, source: &SourceTree) -> bool {
        page.lookup(nth(source, "tr", 0)).is_none()
    }

    #[test]
    fn test_spanning_cell_stays_in_unbroken_table() {
        let source = build_source(vec![el(
            "table",
            vec![
                el(
                    "tr",
                    vec![
                        el_with("td", &[("rowspan", "2")], vec![text("tall")]),
                        el("td", vec![text("a")]),
                    ],
                ),
                el("tr", vec![el("td", vec![text("b")])]),
            ],
        )]);
        let mut page = full_page(&source);
        let a = clone_of(&page, nth(&source, "td", 1));
        empty_cell(&mut page, a);
        let table = clone_of(&page, nth(&source, "table", 0));

        after_page_layout(&source, None, &mut page, None).unwrap();
        assert_eq!(table::table_rows(&page, table).len(), 2);
        assert_eq!(page.attr(clone_of(&page, nth(&source, "td", 0)), attrs::ROWSPAN), Some("2"));
    }

    #[test]
    fn test_states_follow_the_table_across_pages() {
        let source = build_source(vec![el(
            "table",
            vec![
                el("tr", vec![el("td", vec![text("a")])]),
                el("tr", vec![el("td", vec![text("b")])]),
            ],
        )]);
        let mut page = full_page(&source);
        let table = clone_of(&page, nth(&source, "table", 0));
        let inside = BreakTokens::One(BreakToken::at(nth(&source, "tr", 1)));
        let outside = BreakTokens::One(BreakToken::at(source.root()));

        assert_eq!(TableSplit::of(&source, &page, table, None), TableSplit::Unbroken);
        assert_eq!(TableSplit::of(&source, &page, table, Some(&inside)), TableSplit::Splitting);
        mark_resumed(&mut page, table);
        assert_eq!(TableSplit::of(&source, &page, table, Some(&outside)), TableSplit::Resuming);
        assert_eq!(TableSplit::of(&source, &page, table, Some(&inside)), TableSplit::Continuing);
        assert!(TableSplit::Continuing.continues_previous());
        assert!(!TableSplit::Splitting.continues_previous());
    }
}
