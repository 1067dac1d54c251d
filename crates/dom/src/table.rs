//! Table grid metadata and structural helpers.
//!
//! [`tag_tables`] walks every table once, fills a per-table occupancy grid
//! that expands `rowspan`/`colspan`, and records each cell's grid position
//! both in a [`TableIndex`] and as `data-*` attributes on the cell so the
//! position survives cloning.

use crate::cursor::is_ignorable;
use crate::tree::Document;
use crate::{DomError, attrs, classes};
use quire_types::NodeId;
use std::collections::HashMap;

pub const CELL_TAGS: &[&str] = &["td", "th"];
pub const ROW_GROUP_TAGS: &[&str] = &["thead", "tbody", "tfoot"];

/// Largest `colspan` honored, as in HTML.
pub const MAX_COLSPAN: usize = 1000;
/// Largest `rowspan` honored, as in HTML.
pub const MAX_ROWSPAN: usize = 65534;

/// Grid position and identity of one table cell. Coordinates are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetadata {
    pub x_start: usize,
    pub x_end: usize,
    pub y_start: usize,
    pub y_end: usize,
    /// Document-order number of the owning table.
    pub table: usize,
    /// Number of tables enclosing the owning table.
    pub layer: usize,
    /// Document-order number of the cell inside its table.
    pub cell_index: usize,
}

impl CellMetadata {
    pub fn row_span(&self) -> usize {
        self.y_end - self.y_start + 1
    }

    pub fn col_span(&self) -> usize {
        self.x_end - self.x_start + 1
    }

    fn write(&self, doc: &mut Document, cell: NodeId) {
        doc.set_attr(cell, attrs::X_START, self.x_start.to_string());
        doc.set_attr(cell, attrs::X_END, self.x_end.to_string());
        doc.set_attr(cell, attrs::Y_START, self.y_start.to_string());
        doc.set_attr(cell, attrs::Y_END, self.y_end.to_string());
        doc.set_attr(cell, attrs::TABLE_COUNT, self.table.to_string());
        doc.set_attr(cell, attrs::TABLE_LAYER, self.layer.to_string());
        doc.set_attr(cell, attrs::CELL_IDX, self.cell_index.to_string());
    }

    /// Reads the metadata back from a cell's attributes, e.g. on a clone.
    pub fn read(doc: &Document, cell: NodeId) -> Option<Self> {
        let el = doc.element(cell)?;
        Some(Self {
            x_start: el.usize_attr(attrs::X_START)?,
            x_end: el.usize_attr(attrs::X_END)?,
            y_start: el.usize_attr(attrs::Y_START)?,
            y_end: el.usize_attr(attrs::Y_END)?,
            table: el.usize_attr(attrs::TABLE_COUNT)?,
            layer: el.usize_attr(attrs::TABLE_LAYER)?,
            cell_index: el.usize_attr(attrs::CELL_IDX)?,
        })
    }
}

/// Metadata of every cell in a document, keyed by cell node.
#[derive(Debug, Clone, Default)]
pub struct TableIndex {
    cells: HashMap<NodeId, CellMetadata>,
    tables: Vec<NodeId>,
}

impl TableIndex {
    pub fn get(&self, cell: NodeId) -> Option<&CellMetadata> {
        self.cells.get(&cell)
    }

    /// Tables in document order; the position is the table's number.
    pub fn tables(&self) -> &[NodeId] {
        &self.tables
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

// --- Structure queries ---

pub fn is_cell(doc: &Document, node: NodeId) -> bool {
    doc.tag(node).is_some_and(|t| CELL_TAGS.contains(&t))
}

pub fn is_row(doc: &Document, node: NodeId) -> bool {
    doc.has_tag(node, "tr")
}

/// Rows of `table` in order, looking through row groups but not into
/// nested tables.
pub fn table_rows(doc: &Document, table: NodeId) -> Vec<NodeId> {
    let mut rows = Vec::new();
    for child in doc.element_children(table) {
        if is_row(doc, child) {
            rows.push(child);
        } else if doc.tag(child).is_some_and(|t| ROW_GROUP_TAGS.contains(&t)) {
            rows.extend(doc.element_children(child).filter(|&r| is_row(doc, r)));
        }
    }
    rows
}

pub fn row_cells(doc: &Document, row: NodeId) -> Vec<NodeId> {
    doc.element_children(row)
        .filter(|&c| is_cell(doc, c))
        .collect()
}

/// Nearest ancestor-or-self cell, not looking at or above `limit`.
pub fn enclosing_cell(doc: &Document, node: NodeId, limit: NodeId) -> Option<NodeId> {
    doc.closest_within(node, CELL_TAGS, limit)
}

pub fn enclosing_row(doc: &Document, node: NodeId, limit: NodeId) -> Option<NodeId> {
    doc.closest_within(node, &["tr"], limit)
}

pub fn is_cell_end_marker(doc: &Document, node: NodeId) -> bool {
    doc.has_class(node, classes::CELL_END)
}

/// Whether the cell's last child is the end-of-cell marker.
pub fn has_cell_end(doc: &Document, cell: NodeId) -> bool {
    doc.last_child(cell)
        .is_some_and(|c| is_cell_end_marker(doc, c))
}

/// True if anything other than whitespace and the end marker is inside.
pub fn cell_has_content(doc: &Document, cell: NodeId) -> bool {
    doc.children(cell)
        .iter()
        .any(|&c| !is_ignorable(doc, c) && !is_cell_end_marker(doc, c))
}

/// Following sibling cells of `cell` in its row.
pub fn following_cells(doc: &Document, cell: NodeId) -> Vec<NodeId> {
    let mut cells = Vec::new();
    let mut next = doc.next_sibling(cell);
    while let Some(n) = next {
        if is_cell(doc, n) {
            cells.push(n);
        }
        next = doc.next_sibling(n);
    }
    cells
}

/// First following sibling cell of `cell` that has content.
pub fn next_cell_with_content(doc: &Document, cell: NodeId) -> Option<NodeId> {
    following_cells(doc, cell)
        .into_iter()
        .find(|&c| cell_has_content(doc, c))
}

/// No further cell follows `cell` in its row.
pub fn is_last_cell(doc: &Document, cell: NodeId) -> bool {
    following_cells(doc, cell).is_empty()
}

/// A cell with `rowspan` greater than one.
pub fn is_spanning(doc: &Document, cell: NodeId) -> bool {
    doc.element(cell)
        .and_then(|el| el.usize_attr(attrs::ROWSPAN))
        .is_some_and(|span| span > 1)
}

// --- Post-parse pass ---

fn span_attr(doc: &Document, cell: NodeId, name: &str) -> Result<usize, DomError> {
    match doc.attr(cell, name) {
        None => Ok(1),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(span) if span >= 1 => Ok(span),
            _ => Err(DomError::InvalidSpan {
                node: cell,
                name: name.to_string(),
                value: raw.to_string(),
            }),
        },
    }
}

fn clamped_span(doc: &Document, cell: NodeId, name: &str, max: usize) -> usize {
    let span = span_attr(doc, cell, name).unwrap_or_else(|e| {
        log::warn!("{} Treating it as 1.", e);
        1
    });
    if span > max {
        log::warn!("Clamping {} of cell {} from {} to {}.", name, cell, span, max);
    }
    span.min(max)
}

#[derive(Default)]
struct Occupancy {
    rows: Vec<Vec<bool>>,
}

impl Occupancy {
    fn row(&mut self, y: usize) -> &mut Vec<bool> {
        if self.rows.len() <= y {
            self.rows.resize_with(y + 1, Vec::new);
        }
        &mut self.rows[y]
    }

    fn first_free(&mut self, y: usize) -> usize {
        let row = self.row(y);
        row.iter().position(|&taken| !taken).unwrap_or(row.len())
    }

    fn fill(&mut self, x: usize, y: usize, col_span: usize, row_span: usize) {
        let x_end = x.saturating_add(col_span);
        for yy in y..y.saturating_add(row_span) {
            let row = self.row(yy);
            if row.len() < x_end {
                row.resize(x_end, false);
            }
            for slot in &mut row[x..x_end] {
                *slot = true;
            }
        }
    }
}

/// Tags every table cell with its grid metadata.
pub fn tag_tables(doc: &mut Document) -> TableIndex {
    let tables: Vec<NodeId> = doc
        .descendants(doc.root())
        .filter(|&n| doc.has_tag(n, "table"))
        .collect();

    let mut index = TableIndex::default();
    for (table_number, &table) in tables.iter().enumerate() {
        let layer = doc
            .ancestors(table)
            .filter(|&a| doc.has_tag(a, "table"))
            .count();
        let mut grid = Occupancy::default();
        let mut cell_index = 0;

        let rows = table_rows(doc, table);
        let row_count = rows.len();
        for (y, row) in rows.into_iter().enumerate() {
            for cell in row_cells(doc, row) {
                // a rowspan never reaches past the table's last row
                let row_span = clamped_span(doc, cell, attrs::ROWSPAN, MAX_ROWSPAN).min(row_count - y);
                let col_span = clamped_span(doc, cell, attrs::COLSPAN, MAX_COLSPAN);
                let x = grid.first_free(y);
                grid.fill(x, y, col_span, row_span);

                let meta = CellMetadata {
                    x_start: x,
                    x_end: x + col_span - 1,
                    y_start: y,
                    y_end: y + row_span - 1,
                    table: table_number,
                    layer,
                    cell_index,
                };
                meta.write(doc, cell);
                index.cells.insert(cell, meta);
                cell_index += 1;
            }
        }
        log::trace!("Tagged table {} ({} cells)", table_number, cell_index);
    }
    index.tables = tables;
    index
}

/// Appends an end-of-cell marker to every cell that lacks one.
pub fn append_cell_markers(doc: &mut Document, index: &TableIndex) -> Result<(), DomError> {
    let mut cells: Vec<NodeId> = index.cells.keys().copied().collect();
    cells.sort();
    for cell in cells {
        if !has_cell_end(doc, cell) {
            let marker = doc.append_element(cell, "span")?;
            doc.add_class(marker, classes::CELL_END);
        }
    }
    Ok(())
}
