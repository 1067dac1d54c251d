//! Newtype wrappers for node handles and stable references.
//!
//! `NodeId` is an arena index that is only meaningful inside the document
//! that issued it. `RefId` is the stable identifier persisted as `data-ref`
//! and shared between a source node and all of its clones.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Index of a node inside one `Document` arena.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The stable identifier carried by `data-ref`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct RefId(Arc<str>);

impl RefId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RefId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for RefId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for RefId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
