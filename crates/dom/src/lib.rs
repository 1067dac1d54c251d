//! The content tree shared by the source document and every page fragment.
//!
//! Both sides of pagination are [`Document`] arenas: the source is built once
//! and frozen by [`SourceTree::new`], while page fragments are created,
//! filled with clones and trimmed by the layout engine. Clones remember the
//! source node they came from, which is how break tokens are mapped back.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("Node {0} does not exist in this document.")]
    UnknownNode(quire_types::NodeId),
    #[error("The document root cannot be detached or moved.")]
    RootMutation,
    #[error("Node {0} is a text node and cannot have children.")]
    NotAnElement(quire_types::NodeId),
    #[error("Inserting {child} under {parent} would create a cycle.")]
    Cycle {
        parent: quire_types::NodeId,
        child: quire_types::NodeId,
    },
    #[error("Cell {node} has an invalid {name} value '{value}'.")]
    InvalidSpan {
        node: quire_types::NodeId,
        name: String,
        value: String,
    },
}

pub mod cursor;
pub mod node;
pub mod serialize;
pub mod source;
pub mod style;
pub mod table;
pub mod text;
pub mod tree;

pub use cursor::{TreeCursor, is_ignorable, node_after, node_before};
pub use node::{Element, NodeData, NodeKind, Text};
pub use serialize::{inner_html, to_html};
pub use source::SourceTree;
pub use style::InlineStyle;
pub use table::{CellMetadata, TableIndex};
pub use tree::Document;

pub use quire_types::{NodeId, RefId};

/// Attribute names persisted on cloned output.
pub mod attrs {
    pub const REF: &str = "data-ref";
    pub const X_START: &str = "data-x-start";
    pub const X_END: &str = "data-x-end";
    pub const Y_START: &str = "data-y-start";
    pub const Y_END: &str = "data-y-end";
    pub const TABLE_COUNT: &str = "data-table-count";
    pub const TABLE_LAYER: &str = "data-table-layer";
    pub const CELL_IDX: &str = "data-cell-idx";
    pub const SPLIT_FROM: &str = "data-split-from";
    pub const BREAK_BEFORE: &str = "data-break-before";
    pub const BREAK_AFTER: &str = "data-break-after";
    pub const PREVIOUS_BREAK_AFTER: &str = "data-previous-break-after";
    pub const PAGE: &str = "data-page";
    pub const COLUMN_WIDTH: &str = "data-column-width";
    pub const ROWSPAN: &str = "rowspan";
    pub const COLSPAN: &str = "colspan";
    pub const STYLE: &str = "style";
}

/// Transient marker classes written by the engine.
pub mod classes {
    /// A cell duplicated to complete a row; dropped if the real cell shows up.
    pub const ADDED: &str = "quire-added";
    /// Sentinel closing every table cell's content.
    pub const CELL_END: &str = "quire-cell-end";
    /// A cell whose whole content moved to the next page.
    pub const EMPTY_CELL: &str = "quire-empty-cell";
    /// Parent of a text node that received a hyphen glyph at a break.
    pub const HYPHEN: &str = "quire-hyphen";
}
