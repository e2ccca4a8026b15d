use codex_engine::export::{EscapeHighlighter, document_from_markdown, document_to_markdown, render_html};
use codex_engine::model::Node;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
mod common;

fn bench_document_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_creation");
    group.sample_size(20);

    let content = common::generate_markdown_content(100);
    group.bench_function("from_markdown", |b| {
        b.iter(|| {
            let doc = document_from_markdown(black_box(&content)).unwrap();
            black_box(doc);
        });
    });

    let json = common::generate_document(100).to_json();
    group.bench_function("from_json", |b| {
        b.iter(|| {
            let doc = Node::from_json(black_box(&json)).unwrap();
            black_box(doc);
        });
    });

    group.finish();
}

fn bench_document_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_output");
    group.sample_size(20);

    let doc = common::generate_document(100);

    group.bench_function("to_json", |b| b.iter(|| black_box(doc.to_json())));
    group.bench_function("render_html", |b| {
        b.iter(|| black_box(render_html(&doc, &EscapeHighlighter)))
    });
    group.bench_function("to_markdown", |b| b.iter(|| black_box(document_to_markdown(&doc))));

    group.finish();
}

criterion_group!(benches, bench_document_creation, bench_document_output);
criterion_main!(benches);
