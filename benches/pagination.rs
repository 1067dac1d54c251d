//! Pagination throughput benchmarks
//!
//! Measures full page chains for flowing text and for long tables.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use quire::{Paginator, QuireConfig, load_document};
use serde_json::{Value, json};
use std::hint::black_box;
use tokio::runtime::{Builder, Runtime};

fn runtime() -> Runtime {
    Builder::new_current_thread()
        .build()
        .expect("Failed to create Tokio runtime")
}

fn paragraphs(count: usize) -> Value {
    let items: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "tag": "p",
                "children": [format!("Paragraph {} with enough words to wrap over several lines of the page box.", i)]
            })
        })
        .collect();
    Value::Array(items)
}

fn table(rows: usize) -> Value {
    let rows: Vec<Value> = (0..rows)
        .map(|i| {
            json!({ "tag": "tr", "children": [
                { "tag": "td", "children": [format!("Row {}", i)] },
                { "tag": "td", "children": ["some longer cell content that wraps"] },
            ]})
        })
        .collect();
    json!([{ "tag": "table", "children": [{ "tag": "tbody", "children": rows }] }])
}

fn bench_document(c: &mut Criterion, name: &str, sizes: &[usize], build: fn(usize) -> Value) {
    let mut group = c.benchmark_group(name);
    let rt = runtime();
    let config = QuireConfig::default();

    for &size in sizes {
        let source = load_document(&build(size)).expect("Failed to load document");
        group.bench_with_input(BenchmarkId::new("nodes", size), &size, |b, _| {
            b.iter(|| {
                let mut paginator = Paginator::from_config(&config).expect("Invalid config");
                let pages = rt
                    .block_on(paginator.paginate(&source))
                    .expect("Failed to paginate");
                black_box(pages.len())
            });
        });
    }

    group.finish();
}

fn benchmark_paragraphs(c: &mut Criterion) {
    bench_document(c, "pagination_paragraphs", &[10, 100, 500], paragraphs);
}

fn benchmark_tables(c: &mut Criterion) {
    bench_document(c, "pagination_tables", &[10, 100, 500], table);
}

criterion_group!(benches, benchmark_paragraphs, benchmark_tables);
criterion_main!(benches);
