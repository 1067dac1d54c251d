use crate::cursor::node_after;
use crate::table::{self, TableIndex};
use crate::tree::Document;
use crate::{DomError, attrs};
use quire_types::NodeId;
use std::collections::HashSet;
use std::ops::Deref;

/// The parsed document after the post-parse pass, read-only from then on.
///
/// The pass tags table cells with grid metadata, carries `data-break-after`
/// over to the following element, closes every cell with an end-of-cell
/// marker and gives every element a `data-ref`. Refs are assigned last so
/// the markers get one too.
#[derive(Debug)]
pub struct SourceTree {
    doc: Document,
    tables: TableIndex,
}

impl SourceTree {
    pub fn new(mut doc: Document) -> Result<Self, DomError> {
        let tables = table::tag_tables(&mut doc);
        propagate_break_after(&mut doc);
        table::append_cell_markers(&mut doc, &tables)?;
        let assigned = assign_refs(&mut doc);
        log::debug!(
            "Prepared source: {} nodes, {} tables, {} refs assigned",
            doc.node_count(),
            tables.tables().len(),
            assigned
        );
        Ok(Self { doc, tables })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn tables(&self) -> &TableIndex {
        &self.tables
    }

    /// First source node carrying `ref_id`.
    pub fn find_ref(&self, ref_id: &str) -> Option<NodeId> {
        self.doc
            .descendants(self.doc.root())
            .find(|&n| self.doc.ref_id(n) == Some(ref_id))
    }
}

impl Deref for SourceTree {
    type Target = Document;

    fn deref(&self) -> &Document {
        &self.doc
    }
}

/// Copies each `data-break-after` onto the next significant element as
/// `data-previous-break-after`.
fn propagate_break_after(doc: &mut Document) {
    let pairs: Vec<(NodeId, String)> = doc
        .descendants(doc.root())
        .filter_map(|n| {
            let value = doc.attr(n, attrs::BREAK_AFTER)?;
            let mut next = node_after(doc, n, None)?;
            while !doc.is_element(next) {
                next = node_after(doc, next, None)?;
            }
            Some((next, value.to_string()))
        })
        .collect();
    for (node, value) in pairs {
        doc.set_attr(node, attrs::PREVIOUS_BREAK_AFTER, value);
    }
}

fn assign_refs(doc: &mut Document) -> usize {
    let taken: HashSet<String> = doc
        .descendants(doc.root())
        .filter_map(|n| doc.ref_id(n).map(str::to_string))
        .collect();
    let missing: Vec<NodeId> = doc
        .descendants(doc.root())
        .filter(|&n| doc.is_element(n) && doc.ref_id(n).is_none())
        .collect();

    let mut counter = 0;
    for &node in &missing {
        let ref_id = loop {
            counter += 1;
            let candidate = format!("r{}", counter);
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        doc.set_attr(node, attrs::REF, ref_id);
    }
    missing.len()
}
