//! The geometry interface the engine measures fragments through.

use quire_dom::Document;
use quire_dom::text::char_len;
use quire_types::{NodeId, Rect, Size};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakInside {
    #[default]
    Auto,
    Avoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Float {
    #[default]
    None,
    Left,
    Right,
}

/// The computed properties pagination depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComputedStyle {
    pub break_inside: BreakInside,
    pub float: Float,
}

impl ComputedStyle {
    pub fn avoids_break_inside(&self) -> bool {
        self.break_inside == BreakInside::Avoid
    }

    pub fn is_floated(&self) -> bool {
        self.float != Float::None
    }
}

/// A character range `[start, end)` of a text node and its box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub start: usize,
    pub end: usize,
    pub rect: Rect,
}

/// Box geometry for the nodes of a document, as currently laid out.
///
/// Answers must reflect the document passed in, including every mutation
/// made since the previous call. `None` means the node has no box yet.
pub trait GeometryOracle {
    fn rect(&self, doc: &Document, node: NodeId) -> Option<Rect>;

    fn computed_style(&self, doc: &Document, node: NodeId) -> ComputedStyle;

    /// Bounding box of characters `[start, end)` of a text node.
    fn range_rect(&self, doc: &Document, node: NodeId, start: usize, end: usize) -> Option<Rect>;

    /// One box per line fragment of a text node.
    fn client_rects(&self, doc: &Document, node: NodeId) -> Vec<Rect>;

    /// Width and height of everything painted in the document, measured
    /// from the root's origin.
    fn scroll_extent(&self, doc: &Document) -> Size;

    /// Maximal runs of non-whitespace, in order. No-break spaces belong to
    /// words; inside `pre` the whole text is a single word.
    fn word_rects(&self, doc: &Document, node: NodeId) -> Vec<TextBox> {
        let Some(text) = doc.text(node) else {
            return Vec::new();
        };
        let spans = if doc.closest(node, &["pre"]).is_some() {
            vec![(0, char_len(text))]
        } else {
            word_spans(text)
        };
        spans
            .into_iter()
            .filter_map(|(start, end)| {
                self.range_rect(doc, node, start, end)
                    .map(|rect| TextBox { start, end, rect })
            })
            .collect()
    }

    /// Grapheme clusters starting at character `from`, to the end of the node.
    fn letter_rects(&self, doc: &Document, node: NodeId, from: usize) -> Vec<TextBox> {
        let Some(text) = doc.text(node) else {
            return Vec::new();
        };
        grapheme_spans(text)
            .into_iter()
            .filter(|&(start, _)| start >= from)
            .filter_map(|(start, end)| {
                self.range_rect(doc, node, start, end)
                    .map(|rect| TextBox { start, end, rect })
            })
            .collect()
    }
}

/// Whitespace that separates words. No-break spaces do not.
pub fn is_breaking_space(c: char) -> bool {
    c.is_whitespace() && c != '\u{a0}' && c != '\u{202f}'
}

/// Character spans of the words in `text`.
pub fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    let mut len = 0;
    for (i, c) in text.chars().enumerate() {
        match (is_breaking_space(c), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            _ => {}
        }
        len = i + 1;
    }
    if let Some(s) = start {
        spans.push((s, len));
    }
    spans
}

/// Character spans of the grapheme clusters in `text`.
pub fn grapheme_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut at = 0;
    for grapheme in text.graphemes(true) {
        let len = grapheme.chars().count();
        spans.push((at, at + len));
        at += len;
    }
    spans
}
