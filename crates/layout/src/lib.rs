use quire_dom::DomError;
use quire_types::NodeId;
use thiserror::Error;

/// Content that cannot be placed even on an otherwise empty page.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} node(s) cannot fit on an empty page: {:?}", .nodes.len(), .nodes)]
pub struct OverflowContentError {
    pub nodes: Vec<NodeId>,
}

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error(transparent)]
    OverflowContent(#[from] OverflowContentError),
    #[error("Tree error during layout: {0}")]
    Dom(#[from] DomError),
}

pub mod assets;
pub mod breaks;
pub mod config;
pub mod engine;
pub mod fragment;
pub mod hooks;
pub mod metrics;
pub mod oracle;
pub mod overflow;
pub mod region;
pub mod splitter;
pub mod text_break;
pub mod token;

pub use self::assets::{AssetLoader, AssetState, ReadyAssets};
pub use self::config::{LayoutConfig, MetricsConfig};
pub use self::engine::{Layout, RenderedPage};
pub use self::fragment::PageFragment;
pub use self::hooks::{HookEvent, Hooks, LayoutControl};
pub use self::metrics::FlowMetrics;
pub use self::oracle::{ComputedStyle, GeometryOracle, TextBox};
pub use self::region::{Boundary, Extracted, Overflow, OverflowRegion};
pub use self::splitter::{TableSplit, after_page_layout};
pub use self::token::{BreakToken, BreakTokens, OneOrMany};

pub use quire_types::{PageBounds, Rect, Size};

#[cfg(test)]
mod engine_test;
#[cfg(test)]
mod test_utils;
