//! A deterministic monospace flow model implementing [`GeometryOracle`].
//!
//! Blocks stack vertically at full width. Inline content wraps at word
//! boundaries; a word wider than the line is placed anyway and overflows to
//! the right. Every grapheme advances by `char_width`, every line is
//! `line_height` tall. Tables are laid out on an even column grid using the
//! cell metadata written by the post-parse pass.
//!
//! The layout of a document is computed on first query and cached until the
//! document's generation changes.

use crate::config::MetricsConfig;
use crate::oracle::{BreakInside, ComputedStyle, Float, GeometryOracle, is_breaking_space};
use quire_dom::table::{self, CellMetadata};
use quire_dom::{Document, InlineStyle, NodeKind, attrs};
use quire_types::{NodeId, PageBounds, Rect, Size};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use unicode_segmentation::UnicodeSegmentation;

/// Elements laid out inline.
pub const INLINE_TAGS: &[&str] = &[
    "span", "a", "em", "strong", "b", "i", "u", "code", "sup", "sub", "small", "br", "wbr",
    "abbr", "cite", "q", "time", "var", "kbd", "samp", "mark", "s", "label",
];

#[derive(Debug, Default)]
struct Flow {
    boxes: HashMap<NodeId, Rect>,
    lines: HashMap<NodeId, Vec<Rect>>,
    glyphs: HashMap<NodeId, Vec<Rect>>,
    extent: Size,
}

#[derive(Debug)]
struct CachedFlow {
    doc_id: u64,
    generation: u64,
    flow: Rc<Flow>,
}

#[derive(Debug)]
pub struct FlowMetrics {
    config: MetricsConfig,
    origin: (f32, f32),
    width: f32,
    cache: RefCell<Option<CachedFlow>>,
}

impl FlowMetrics {
    pub fn new(config: MetricsConfig, left: f32, top: f32, width: f32) -> Self {
        Self {
            config,
            origin: (left, top),
            width,
            cache: RefCell::new(None),
        }
    }

    /// Lays documents out in the content area of `bounds`.
    pub fn for_bounds(config: MetricsConfig, bounds: &PageBounds) -> Self {
        Self::new(config, bounds.rect.left, bounds.rect.top, bounds.width())
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    fn flow(&self, doc: &Document) -> Rc<Flow> {
        let mut cache = self.cache.borrow_mut();
        if let Some(cached) = cache.as_ref() {
            if cached.doc_id == doc.id() && cached.generation == doc.generation() {
                return Rc::clone(&cached.flow);
            }
        }

        let mut builder = FlowBuilder {
            doc,
            char_width: self.config.char_width,
            line_height: self.config.line_height,
            flow: Flow::default(),
        };
        let (x, y) = self.origin;
        builder.block(doc.root(), x, y, self.width);
        let mut flow = builder.flow;
        flow.extent = extent(&flow, x, y);
        log::trace!(
            "Laid out document {} generation {}: {} boxes",
            doc.id(),
            doc.generation(),
            flow.boxes.len()
        );

        let flow = Rc::new(flow);
        *cache = Some(CachedFlow {
            doc_id: doc.id(),
            generation: doc.generation(),
            flow: Rc::clone(&flow),
        });
        flow
    }
}

fn extent(flow: &Flow, x: f32, y: f32) -> Size {
    match Rect::union_all(flow.boxes.values().copied()) {
        Some(r) => Size::new((r.right - x).max(0.0), (r.bottom - y).max(0.0)),
        None => Size::zero(),
    }
}

impl GeometryOracle for FlowMetrics {
    fn rect(&self, doc: &Document, node: NodeId) -> Option<Rect> {
        self.flow(doc).boxes.get(&node).copied()
    }

    fn computed_style(&self, doc: &Document, node: NodeId) -> ComputedStyle {
        let Some(raw) = doc.attr(node, attrs::STYLE) else {
            return ComputedStyle::default();
        };
        let style = InlineStyle::parse(raw);
        let break_inside = match style.get("break-inside") {
            Some("avoid" | "avoid-page" | "avoid-column") => BreakInside::Avoid,
            _ => BreakInside::Auto,
        };
        let float = match style.get("float") {
            Some("left") | Some("inline-start") => Float::Left,
            Some("right") | Some("inline-end") => Float::Right,
            _ => Float::None,
        };
        ComputedStyle {
            break_inside,
            float,
        }
    }

    fn range_rect(&self, doc: &Document, node: NodeId, start: usize, end: usize) -> Option<Rect> {
        let flow = self.flow(doc);
        let glyphs = flow.glyphs.get(&node)?;
        let end = end.min(glyphs.len());
        if start >= end {
            return None;
        }
        Rect::union_all(glyphs[start..end].iter().copied())
    }

    fn client_rects(&self, doc: &Document, node: NodeId) -> Vec<Rect> {
        self.flow(doc)
            .lines
            .get(&node)
            .cloned()
            .unwrap_or_default()
    }

    fn scroll_extent(&self, doc: &Document) -> Size {
        self.flow(doc).extent
    }
}

fn is_inline_level(doc: &Document, node: NodeId) -> bool {
    match doc.tag(node) {
        None => true,
        Some(tag) => INLINE_TAGS.contains(&tag),
    }
}

fn style_of(doc: &Document, node: NodeId) -> InlineStyle {
    doc.attr(node, attrs::STYLE)
        .map(InlineStyle::parse)
        .unwrap_or_default()
}

fn is_hidden(style: &InlineStyle) -> bool {
    style.get("display") == Some("none")
}

/// Position of the pen inside one inline formatting context.
struct Line {
    left: f32,
    top: f32,
    width: f32,
    line_height: f32,
    x: f32,
    index: usize,
    has_content: bool,
    after_space: bool,
}

impl Line {
    fn y(&self) -> f32 {
        self.top + self.index as f32 * self.line_height
    }

    fn pen(&self) -> f32 {
        self.left + self.x
    }

    fn glyph(&self, advance: f32) -> Rect {
        Rect::from_origin(self.pen(), self.y(), advance, self.line_height)
    }

    fn break_line(&mut self) {
        self.index += 1;
        self.x = 0.0;
        self.after_space = false;
    }

    fn height(&self) -> f32 {
        if self.has_content {
            (self.index + 1) as f32 * self.line_height
        } else {
            0.0
        }
    }
}

struct Spanning {
    cell: NodeId,
    left: f32,
    width: f32,
    top: f32,
    content_height: f32,
    last_row: usize,
}

struct FlowBuilder<'a> {
    doc: &'a Document,
    char_width: f32,
    line_height: f32,
    flow: Flow,
}

impl FlowBuilder<'_> {
    fn record(&mut self, node: NodeId, rect: Rect) {
        self.flow.boxes.insert(node, rect);
    }

    /// Lays out a block-level element; returns its height.
    fn block(&mut self, node: NodeId, x: f32, y: f32, width: f32) -> f32 {
        let style = style_of(self.doc, node);
        if is_hidden(&style) {
            return 0.0;
        }
        match self.doc.tag(node) {
            Some("img") => return self.image(node, &style, x, y),
            Some("table") => return self.table(node, x, y, width),
            _ => {}
        }

        let width = style.length("width").unwrap_or(width);
        let content = self.children(node, x, y, width);
        let height = style.length("height").unwrap_or(content);
        self.record(node, Rect::from_origin(x, y, width, height));
        height
    }

    fn image(&mut self, node: NodeId, style: &InlineStyle, x: f32, y: f32) -> f32 {
        let dimension = |name: &str| {
            style.length(name).or_else(|| {
                self.doc
                    .attr(node, name)
                    .and_then(quire_dom::style::parse_length)
            })
        };
        let width = dimension("width").unwrap_or(0.0);
        let height = dimension("height").unwrap_or(0.0);
        self.record(node, Rect::from_origin(x, y, width, height));
        height
    }

    /// Lays out the children of a block container; returns the content height.
    fn children(&mut self, node: NodeId, x: f32, y: f32, width: f32) -> f32 {
        let doc = self.doc;
        let mut cursor = y;
        let mut run = Vec::new();
        for &child in doc.children(node) {
            if is_inline_level(doc, child) {
                run.push(child);
                continue;
            }
            cursor += self.inline_run(&run, x, cursor, width);
            run.clear();
            cursor += self.block(child, x, cursor, width);
        }
        cursor += self.inline_run(&run, x, cursor, width);
        cursor - y
    }

    fn inline_run(&mut self, nodes: &[NodeId], x: f32, y: f32, width: f32) -> f32 {
        let Some(&first) = nodes.first() else {
            return 0.0;
        };
        let preformatted = self.doc.closest(first, &["pre"]).is_some();
        let mut line = Line {
            left: x,
            top: y,
            width,
            line_height: self.line_height,
            x: 0.0,
            index: 0,
            has_content: false,
            after_space: false,
        };
        for &node in nodes {
            self.inline(node, &mut line, preformatted);
        }
        line.height()
    }

    fn inline(&mut self, node: NodeId, line: &mut Line, preformatted: bool) {
        let doc = self.doc;
        match doc.kind(node) {
            NodeKind::Text(text) => self.text(node, &text.content, line, preformatted),
            NodeKind::Element(el) => {
                if is_hidden(&style_of(doc, node)) {
                    return;
                }
                match el.tag.as_str() {
                    "br" => {
                        self.record(node, line.glyph(0.0));
                        line.has_content = true;
                        line.break_line();
                    }
                    "img" => {
                        let style = style_of(doc, node);
                        let top = line.y();
                        let pen = line.pen();
                        let height = self.image(node, &style, pen, top);
                        let advance = self.flow.boxes.get(&node).map_or(0.0, Rect::width);
                        line.x += advance;
                        line.has_content |= advance > 0.0 || height > 0.0;
                        line.after_space = false;
                    }
                    _ => {
                        let start = Rect::from_origin(line.pen(), line.y(), 0.0, 0.0);
                        let children = doc.children(node);
                        for &child in children {
                            self.inline(child, line, preformatted);
                        }
                        let rect = children
                            .iter()
                            .filter_map(|c| self.flow.boxes.get(c).copied())
                            .fold(start, |acc, r| acc.union(&r));
                        self.record(node, rect);
                    }
                }
            }
        }
    }

    fn text(&mut self, node: NodeId, content: &str, line: &mut Line, preformatted: bool) {
        let chars: Vec<char> = content.chars().collect();
        let mut advances = vec![0.0; chars.len()];
        let mut at = 0;
        for grapheme in content.graphemes(true) {
            if at < advances.len() {
                advances[at] = self.char_width;
            }
            at += grapheme.chars().count();
        }

        let mut glyphs: Vec<Rect> = Vec::with_capacity(chars.len());
        if preformatted {
            for (i, &c) in chars.iter().enumerate() {
                if c == '\n' {
                    glyphs.push(line.glyph(0.0));
                    line.has_content = true;
                    line.break_line();
                    continue;
                }
                glyphs.push(line.glyph(advances[i]));
                line.x += advances[i];
                line.has_content = true;
            }
        } else {
            let mut i = 0;
            while i < chars.len() {
                let space = is_breaking_space(chars[i]);
                let mut j = i;
                while j < chars.len() && is_breaking_space(chars[j]) == space {
                    j += 1;
                }
                if space {
                    for k in i..j {
                        let collapsed = k > i || line.after_space || line.x == 0.0;
                        let fits = line.x + self.char_width <= line.width;
                        let advance = if collapsed || !fits { 0.0 } else { self.char_width };
                        glyphs.push(line.glyph(advance));
                        line.x += advance;
                    }
                    line.after_space = true;
                } else {
                    let word_width: f32 = advances[i..j].iter().sum();
                    if line.x > 0.0 && line.x + word_width > line.width {
                        line.break_line();
                    }
                    for advance in &advances[i..j] {
                        glyphs.push(line.glyph(*advance));
                        line.x += advance;
                    }
                    line.has_content = true;
                    line.after_space = false;
                }
                i = j;
            }
        }

        let rect = Rect::union_all(glyphs.iter().filter(|g| g.width() > 0.0).copied())
            .unwrap_or_else(|| Rect::from_origin(line.pen(), line.y(), 0.0, 0.0));
        let mut lines: Vec<Rect> = Vec::new();
        for glyph in &glyphs {
            match lines.last_mut() {
                Some(last) if last.top == glyph.top => *last = last.union(glyph),
                _ => lines.push(*glyph),
            }
        }
        self.record(node, rect);
        self.flow.lines.insert(node, lines);
        self.flow.glyphs.insert(node, glyphs);
    }

    fn table(&mut self, node: NodeId, x: f32, y: f32, width: f32) -> f32 {
        let rows = table::table_rows(self.doc, node);
        let grid: Vec<Vec<(NodeId, usize, usize)>> = rows
            .iter()
            .map(|&row| {
                let mut next_x = 0;
                table::row_cells(self.doc, row)
                    .into_iter()
                    .map(|cell| {
                        let (start, end) = match CellMetadata::read(self.doc, cell) {
                            Some(meta) => (meta.x_start, meta.x_end),
                            None => {
                                let span = self
                                    .doc
                                    .element(cell)
                                    .and_then(|el| el.usize_attr(attrs::COLSPAN))
                                    .unwrap_or(1)
                                    .max(1);
                                (next_x, next_x + span - 1)
                            }
                        };
                        next_x = end + 1;
                        (cell, start, end)
                    })
                    .collect()
            })
            .collect();
        let columns = grid
            .iter()
            .flatten()
            .map(|&(_, _, end)| end + 1)
            .max()
            .unwrap_or(1);
        let column_width = width / columns as f32;

        let mut spanning: Vec<Spanning> = Vec::new();
        let mut row_bottoms = Vec::with_capacity(rows.len());
        let mut cursor = y;
        for (r, (&row, cells)) in rows.iter().zip(&grid).enumerate() {
            let mut row_height: f32 = 0.0;
            let mut placed = Vec::new();
            for &(cell, start, end) in cells {
                let left = x + start as f32 * column_width;
                let cell_width = (end - start + 1) as f32 * column_width;
                let content = if is_hidden(&style_of(self.doc, cell)) {
                    0.0
                } else {
                    self.children(cell, left, cursor, cell_width)
                };
                let span = self
                    .doc
                    .element(cell)
                    .and_then(|el| el.usize_attr(attrs::ROWSPAN))
                    .unwrap_or(1)
                    .clamp(1, rows.len() - r);
                if span == 1 {
                    row_height = row_height.max(content);
                    placed.push((cell, left, cell_width));
                } else {
                    spanning.push(Spanning {
                        cell,
                        left,
                        width: cell_width,
                        top: cursor,
                        content_height: content,
                        last_row: r + span - 1,
                    });
                }
            }
            for (cell, left, cell_width) in placed {
                self.record(cell, Rect::from_origin(left, cursor, cell_width, row_height));
            }
            self.record(row, Rect::from_origin(x, cursor, width, row_height));
            cursor += row_height;
            row_bottoms.push(cursor);
        }

        let mut bottom = cursor;
        for s in spanning {
            let rows_bottom = row_bottoms.get(s.last_row).copied().unwrap_or(cursor);
            let cell_bottom = (s.top + s.content_height).max(rows_bottom);
            self.record(s.cell, Rect::new(s.left, s.top, s.left + s.width, cell_bottom));
            bottom = bottom.max(cell_bottom);
        }

        for group in self.doc.element_children(node).collect::<Vec<_>>() {
            if !self
                .doc
                .tag(group)
                .is_some_and(|t| table::ROW_GROUP_TAGS.contains(&t))
            {
                continue;
            }
            let rect = self
                .doc
                .element_children(group)
                .filter_map(|r| self.flow.boxes.get(&r).copied())
                .reduce(|a, b| a.union(&b))
                .unwrap_or_else(|| Rect::from_origin(x, y, width, 0.0));
            self.record(group, rect);
        }

        self.record(node, Rect::new(x, y, x + width, bottom));
        bottom - y
    }
}
