use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Number of rendered characters after which the engine measures the
    /// page instead of appending more content.
    ///
    /// This is a throttle, not a fit test: a page may hold more or fewer
    /// characters. Lower values measure more often.
    ///
    /// Defaults to `1500`.
    pub max_chars: usize,
    /// Appended to the text before a break that splits a word.
    ///
    /// Defaults to U+2011 (non-breaking hyphen).
    pub hyphen_glyph: char,
    pub hyphenate: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_chars: 1500,
            hyphen_glyph: '\u{2011}',
            hyphenate: true,
        }
    }
}

/// Advances used by [`crate::FlowMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsConfig {
    /// Horizontal advance of one grapheme.
    pub char_width: f32,
    pub line_height: f32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 16.0,
        }
    }
}
