pub mod geometry;
pub mod ids;

pub use geometry::{PageBounds, Rect, Size};
pub use ids::{NodeId, RefId};
