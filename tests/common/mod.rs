pub mod fixtures;

use quire::{PageConfig, PageFragment, Paginator, QuireConfig, QuireError, load_document};
use quire_layout::{LayoutConfig, MetricsConfig};
use serde_json::Value;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A margin-free page of `width` x `height` with 10x10 monospace metrics.
pub fn config(width: f32, height: f32) -> QuireConfig {
    QuireConfig {
        page: PageConfig {
            width,
            height,
            margin: 0.0,
            column_gap: 0.0,
        },
        layout: LayoutConfig::default(),
        metrics: MetricsConfig {
            char_width: 10.0,
            line_height: 10.0,
        },
        max_pages: 1000,
    }
}

/// Loads `document` and paginates it with `config`.
pub async fn paginate(document: &Value, config: &QuireConfig) -> Result<Vec<PageFragment>, QuireError> {
    let source = load_document(document)?;
    let mut paginator = Paginator::from_config(config)?;
    paginator.paginate(&source).await
}

pub fn texts(pages: &[PageFragment]) -> Vec<String> {
    pages.iter().map(|p| p.text()).collect()
}
