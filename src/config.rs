use crate::error::QuireError;
use quire_layout::{LayoutConfig, MetricsConfig};
use quire_types::{PageBounds, Rect};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Page box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageConfig {
    pub width: f32,
    pub height: f32,
    /// Applied on all four sides.
    pub margin: f32,
    pub column_gap: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        // A5 at 96dpi
        Self {
            width: 559.0,
            height: 794.0,
            margin: 48.0,
            column_gap: 0.0,
        }
    }
}

impl PageConfig {
    /// The content box inside the margins.
    pub fn bounds(&self) -> Result<PageBounds, QuireError> {
        let width = self.width - 2.0 * self.margin;
        let height = self.height - 2.0 * self.margin;
        if width <= 0.0 || height <= 0.0 {
            return Err(QuireError::Config(format!(
                "margin {} leaves no content area on a {}x{} page",
                self.margin, self.width, self.height
            )));
        }
        if self.column_gap < 0.0 {
            return Err(QuireError::Config(format!(
                "column gap must not be negative, got {}",
                self.column_gap
            )));
        }
        let rect = Rect::from_origin(self.margin, self.margin, width, height);
        Ok(PageBounds::with_gap(rect, self.column_gap))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuireConfig {
    pub page: PageConfig,
    pub layout: LayoutConfig,
    pub metrics: MetricsConfig,
    /// A run producing more pages than this fails.
    pub max_pages: usize,
}

impl Default for QuireConfig {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            layout: LayoutConfig::default(),
            metrics: MetricsConfig::default(),
            max_pages: 1000,
        }
    }
}

impl QuireConfig {
    pub fn from_json(json: &str) -> Result<Self, QuireError> {
        let config: QuireConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, QuireError> {
        let path = path.as_ref();
        log::debug!("Loading configuration from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), QuireError> {
        self.page.bounds()?;
        if self.layout.max_chars == 0 {
            return Err(QuireError::Config("maxChars must be at least 1".to_string()));
        }
        if self.metrics.char_width <= 0.0 || self.metrics.line_height <= 0.0 {
            return Err(QuireError::Config(
                "charWidth and lineHeight must be positive".to_string(),
            ));
        }
        if self.max_pages == 0 {
            return Err(QuireError::Config("maxPages must be at least 1".to_string()));
        }
        Ok(())
    }
}
