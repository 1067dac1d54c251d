//! Narrowing an overflowing text node to a character offset.

use crate::oracle::GeometryOracle;
use quire_dom::Document;
use quire_types::NodeId;

/// The horizontal and vertical edges content must not cross.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edges {
    pub h_end: f32,
    pub v_end: f32,
}

/// Offset of the first character of `node` that does not fit inside `edges`.
///
/// A word that starts past an edge breaks before itself. A word that
/// straddles an edge is searched letter by letter, continuing past the
/// word, for the first letter that crosses. A break preceded only by
/// whitespace is moved to the start of the node. `None` means every
/// character fits.
pub fn text_break<O>(oracle: &O, doc: &Document, node: NodeId, edges: Edges) -> Option<usize>
where
    O: GeometryOracle + ?Sized,
{
    let mut offset = None;
    for word in oracle.word_rects(doc, node) {
        let left = word.rect.left.floor();
        let top = word.rect.top.floor();
        if left >= edges.h_end || top >= edges.v_end {
            offset = Some(word.start);
            break;
        }

        let right = word.rect.right.floor();
        let bottom = word.rect.bottom.floor();
        if right > edges.h_end || bottom > edges.v_end {
            let letter = oracle
                .letter_rects(doc, node, word.start)
                .into_iter()
                .find(|l| l.rect.right.floor() > edges.h_end || l.rect.bottom.floor() > edges.v_end);
            if let Some(letter) = letter {
                offset = Some(letter.start);
                break;
            }
        }
    }

    let offset = offset?;
    let text = doc.text(node).unwrap_or_default();
    if offset > 0 && quire_dom::text::prefix(text, offset).trim().is_empty() {
        return Some(0);
    }
    log::trace!("Text {} breaks at offset {}", node, offset);
    Some(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsConfig;
    use crate::metrics::FlowMetrics;

    fn oracle(width: f32) -> FlowMetrics {
        FlowMetrics::new(
            MetricsConfig {
                char_width: 10.0,
                line_height: 10.0,
            },
            0.0,
            0.0,
            width,
        )
    }

    fn edges(h_end: f32, v_end: f32) -> Edges {
        Edges { h_end, v_end }
    }

    #[test]
    fn test_breaks_before_first_word_below_the_edge() {
        let mut doc = Document::new("body");
        let text = doc.append_text(doc.root(), "aaa bbb ccc ddd").unwrap();
        // one word per 40px line
        let m = oracle(40.0);
        assert_eq!(text_break(&m, &doc, text, edges(40.0, 20.0)), Some(8));
        assert_eq!(text_break(&m, &doc, text, edges(40.0, 100.0)), None);
    }

    #[test]
    fn test_straddling_word_breaks_at_letter() {
        let mut doc = Document::new("body");
        let text = doc
            .append_text(doc.root(), "Supercalifragilisticexpialidocious")
            .unwrap();
        let m = oracle(100.0);
        assert_eq!(text_break(&m, &doc, text, edges(100.0, 100.0)), Some(10));
    }

    #[test]
    fn test_leading_whitespace_collapses_to_zero() {
        let mut doc = Document::new("body");
        let text = doc.append_text(doc.root(), "   word").unwrap();
        let m = oracle(100.0);
        assert_eq!(text_break(&m, &doc, text, edges(100.0, 0.0)), Some(0));
    }

    #[test]
    fn test_no_break_space_keeps_words_together() {
        let mut doc = Document::new("body");
        let text = doc.append_text(doc.root(), "ab cd\u{a0}ef").unwrap();
        let m = oracle(40.0);
        // "cd ef" is one word and wraps to the second line as a whole
        assert_eq!(text_break(&m, &doc, text, edges(40.0, 10.0)), Some(3));
    }
}
