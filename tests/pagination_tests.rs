mod common;

use common::fixtures::*;
use common::{TestResult, config, init_logger, paginate, texts};
use quire::{FlowMetrics, LayoutError, Paginator, QuireConfig, QuireError, load_document};
use quire_layout::overflow::has_overflow;
use serde_json::json;
use std::io::Write;

fn long_document(paragraphs: usize) -> serde_json::Value {
    document(
        (1..=paragraphs)
            .map(|i| paragraph(&format!("Paragraph {} has a few words that wrap across lines.", i)))
            .collect(),
    )
}

#[tokio::test]
async fn test_long_document_round_trips_across_pages() -> TestResult {
    init_logger();
    let json = long_document(40);
    let config = config(200.0, 100.0);
    let pages = paginate(&json, &config).await?;

    assert!(pages.len() > 5, "expected many pages, got {}", pages.len());
    let source = load_document(&json)?;
    assert_eq!(texts(&pages).concat(), source.text_content(source.root()));

    let bounds = config.page.bounds()?;
    let metrics = FlowMetrics::for_bounds(config.metrics, &bounds);
    for (i, page) in pages.iter().enumerate() {
        assert!(!has_overflow(&metrics, page, &bounds), "page {} overflows", i + 1);
        assert!(!page.is_blank(), "page {} is blank", i + 1);
    }
    Ok(())
}

#[tokio::test]
async fn test_explicit_page_breaks() -> TestResult {
    init_logger();
    let json = document(vec![
        paragraph("Page 1 content"),
        element_with("p", json!({ "data-break-before": "page" }), vec![json!("Page 2 content")]),
        element_with("div", json!({ "data-break-after": "page" }), vec![paragraph("Still page 2")]),
        paragraph("Page 3 content"),
    ]);
    let pages = paginate(&json, &config(400.0, 400.0)).await?;

    assert_eq!(
        texts(&pages),
        vec!["Page 1 content", "Page 2 contentStill page 2", "Page 3 content"]
    );
    Ok(())
}

#[tokio::test]
async fn test_page_limit_stops_the_run() {
    let mut config = config(200.0, 100.0);
    config.max_pages = 2;
    let err = paginate(&long_document(40), &config).await.unwrap_err();
    assert!(matches!(err, QuireError::PageLimit(2)));
}

#[tokio::test]
async fn test_content_taller_than_any_page_fails() {
    let json = document(vec![element_with(
        "img",
        json!({ "width": 20, "height": 500 }),
        vec![],
    )]);
    let err = paginate(&json, &config(200.0, 100.0)).await.unwrap_err();
    assert!(matches!(err, QuireError::Layout(LayoutError::OverflowContent(_))));
}

#[tokio::test]
async fn test_config_loaded_from_file() -> TestResult {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{ "page": {{ "width": 200, "height": 100, "margin": 0 }},
             "metrics": {{ "charWidth": 10, "lineHeight": 10 }},
             "layout": {{ "maxChars": 40 }} }}"#
    )?;
    let config = QuireConfig::from_path(file.path())?;
    assert_eq!(config.layout.max_chars, 40);

    let json = long_document(12);
    let source = load_document(&json)?;
    let mut paginator = Paginator::from_config(&config)?;
    let pages = paginator.paginate(&source).await?;
    assert_eq!(texts(&pages).concat(), source.text_content(source.root()));
    Ok(())
}

#[tokio::test]
async fn test_hooks_registered_on_the_paginator_run_for_every_page() -> TestResult {
    let json = long_document(20);
    let source = load_document(&json)?;
    let mut paginator = Paginator::from_config(&config(200.0, 100.0))?;
    let started = std::rc::Rc::new(std::cell::Cell::new(0));
    let counter = std::rc::Rc::clone(&started);
    paginator
        .layout_mut()
        .hooks_mut()
        .on_page_layout("count", move |_, _| counter.set(counter.get() + 1));

    let pages = paginator.paginate(&source).await?;
    assert_eq!(started.get(), pages.len());
    Ok(())
}
