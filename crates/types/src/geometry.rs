use serde::{Deserialize, Serialize};

/// An axis-aligned box in page coordinates, expressed by its four edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_origin(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// A box with no area. Zero-width boxes still carry a position.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Folds a sequence of boxes into their bounding box.
    pub fn union_all<I>(rects: I) -> Option<Rect>
    where
        I: IntoIterator<Item = Rect>,
    {
        rects.into_iter().reduce(|acc, r| acc.union(&r))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
        }
    }
}

/// The region content must fit inside for the current page or column.
///
/// `column_gap` widens the usable right edge when the page area is laid out
/// in columns: content may run into the gap before it counts as overflowing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBounds {
    pub rect: Rect,
    #[serde(default)]
    pub column_gap: f32,
}

impl PageBounds {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            column_gap: 0.0,
        }
    }

    pub fn with_gap(rect: Rect, column_gap: f32) -> Self {
        Self { rect, column_gap }
    }

    /// Page of `width` x `height` whose content area starts at the origin.
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(Rect::from_origin(0.0, 0.0, width, height))
    }

    pub fn width(&self) -> f32 {
        self.rect.width()
    }

    pub fn height(&self) -> f32 {
        self.rect.height()
    }

    /// Leftmost usable coordinate, floored to whole units.
    pub fn h_start(&self) -> f32 {
        self.rect.left.floor()
    }

    /// Rightmost usable coordinate including the column gap.
    pub fn h_end(&self) -> f32 {
        (self.rect.right + self.column_gap).round()
    }

    pub fn v_start(&self) -> f32 {
        self.rect.top.round()
    }

    pub fn v_end(&self) -> f32 {
        self.rect.bottom.round()
    }
}
