// src/error.rs
use quire_dom::DomError;
use quire_layout::LayoutError;
use thiserror::Error;

/// Everything that can stop a pagination run.
#[derive(Error, Debug)]
pub enum QuireError {
    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("Document tree error: {0}")]
    Dom(#[from] DomError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration is invalid: {0}")]
    Config(String),

    #[error("Document needs more than {0} pages")]
    PageLimit(usize),

    #[error("Document input is invalid: {0}")]
    Document(String),
}
