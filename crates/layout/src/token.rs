use quire_types::NodeId;
use std::fmt;

/// Where the next page resumes: a source node and, for text, a character
/// offset into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BreakToken {
    pub node: NodeId,
    pub offset: usize,
}

impl BreakToken {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Resume at the start of `node`.
    pub fn at(node: NodeId) -> Self {
        Self { node, offset: 0 }
    }
}

impl fmt::Display for BreakToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.node, self.offset)
    }
}

/// A single value, or an ordered list of them when table columns were
/// tracked separately.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Empty input yields `None`, a single entry collapses to `One`.
    pub fn from_vec(mut items: Vec<T>) -> Option<Self> {
        match items.len() {
            0 => None,
            1 => items.pop().map(OneOrMany::One),
            _ => Some(OneOrMany::Many(items)),
        }
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item),
            OneOrMany::Many(items) => items,
        }
    }

    pub fn first(&self) -> Option<&T> {
        self.as_slice().first()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn is_many(&self) -> bool {
        matches!(self, OneOrMany::Many(_))
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(item: T) -> Self {
        OneOrMany::One(item)
    }
}

impl<'a, T> IntoIterator for &'a OneOrMany<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The resume point(s) produced by one page.
pub type BreakTokens = OneOrMany<BreakToken>;

impl fmt::Display for BreakTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OneOrMany::One(token) => write!(f, "{}", token),
            OneOrMany::Many(tokens) => {
                write!(f, "[")?;
                for (i, token) in tokens.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", token)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_entry_collapses() {
        let token = BreakToken::new(NodeId::new(4), 2);
        assert_eq!(OneOrMany::from_vec(vec![token]), Some(OneOrMany::One(token)));
        assert_eq!(OneOrMany::<BreakToken>::from_vec(Vec::new()), None);

        let many = OneOrMany::from_vec(vec![token, BreakToken::at(NodeId::new(9))]).unwrap();
        assert!(many.is_many());
        assert_eq!(many.first(), Some(&token));
        assert_eq!(many.to_string(), "[#4@2, #9@0]");
    }

    #[test]
    fn test_equality_needs_node_and_offset() {
        let a = BreakToken::new(NodeId::new(1), 3);
        assert_eq!(a, BreakToken::new(NodeId::new(1), 3));
        assert_ne!(a, BreakToken::new(NodeId::new(1), 4));
        assert_ne!(a, BreakToken::new(NodeId::new(2), 3));
    }
}
