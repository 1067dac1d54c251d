pub mod config;
pub mod document;
pub mod error;
pub mod paginator;

pub use config::{PageConfig, QuireConfig};
pub use document::{load_document, load_document_path, load_document_str};
pub use error::QuireError;
pub use paginator::Paginator;

// Re-export the engine surface so callers need only this crate.
pub use quire_dom::{Document, NodeId, SourceTree};
pub use quire_layout::{
    BreakToken, BreakTokens, FlowMetrics, GeometryOracle, HookEvent, Hooks, Layout, LayoutConfig,
    LayoutControl, LayoutError, MetricsConfig, OverflowContentError, PageFragment, RenderedPage,
};
pub use quire_types::{PageBounds, Rect};
