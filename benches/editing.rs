//! Benchmarks for edit operations on a large document.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use loom::document::{CursorPosition, Document};
use loom::editor::Editor;

fn large_document() -> Document {
    let md = include_str!("../tests/fixtures/sample.md");
    Document::load(&md.repeat(20))
}

fn bench_split_merge(c: &mut Criterion) {
    let document = large_document();
    c.bench_function("split_then_merge", |b| {
        b.iter_batched(
            || Editor::new(document.clone()),
            |mut editor| {
                let outcome = editor.split(CursorPosition::new(2, 5)).unwrap();
                editor.backspace(black_box(outcome.cursor)).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_typing(c: &mut Criterion) {
    let document = large_document();
    c.bench_function("insert_text", |b| {
        b.iter_batched(
            || Editor::new(document.clone()),
            |mut editor| editor.insert_text(CursorPosition::new(2, 0), black_box("x")).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_split_merge, bench_typing);
criterion_main!(benches);
