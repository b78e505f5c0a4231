//! Benchmarks for render passes and expression evaluation.
//!
//! Run with: `cargo bench --package glint-core --bench render`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glint_core::binder::MemorySink;
use glint_core::{Binder, Document, Evaluator, Store};

/// A page with `rows` bound rows, each with a display and a click directive.
fn page(rows: usize) -> String {
    let mut markup = String::from("<table>");
    for i in 0..rows {
        markup.push_str(&format!(
            r#"<tr><td @data="items[{i}].label.toUpperCase()"></td><td @data="`${{items[{i}].count}} x ${{price.toFixed(2)}}`"></td><td><button @click="items[{i}].count++">+</button></td></tr>"#
        ));
    }
    markup.push_str("</table>");
    markup
}

fn store(rows: usize) -> Store {
    let items: Vec<serde_json::Value> = (0..rows)
        .map(|i| serde_json::json!({ "label": format!("row {i}"), "count": i }))
        .collect();
    let state = serde_json::json!({ "items": items, "price": 9.5, "tick": 0 });
    Store::from_json(&state.to_string()).unwrap_or_default()
}

fn bench_render_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_pass");
    for rows in [10, 100, 1_000] {
        let document = Document::parse(&page(rows)).unwrap_or_default();
        let store = store(rows);
        let binder = Binder::builder(&document, &store)
            .diagnostics(MemorySink::new())
            .bind()
            .ok();
        group.throughput(Throughput::Elements((rows * 2) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                if let Some(binder) = &binder {
                    binder.refresh();
                }
            })
        });
    }
    group.finish();
}

fn bench_store_write(c: &mut Criterion) {
    let rows = 100;
    let document = Document::parse(&page(rows)).unwrap_or_default();
    let store = store(rows);
    let _binder = Binder::builder(&document, &store)
        .diagnostics(MemorySink::new())
        .bind()
        .ok();
    let mut tick = 0;
    c.bench_function("store_write_rerender_100_rows", |b| {
        b.iter(|| {
            tick += 1;
            store.set("tick", black_box(tick));
        })
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let store = store(10);
    let cached = Evaluator::default();
    let uncached = Evaluator::new(0);
    let text = "items.slice(0, 5).join(', ') + ' / ' + Math.max(price, 3) * 2";

    let mut group = c.benchmark_group("evaluate_expression");
    group.bench_function("cached", |b| {
        b.iter(|| cached.evaluate_expression(black_box(text), &store))
    });
    group.bench_function("uncached", |b| {
        b.iter(|| uncached.evaluate_expression(black_box(text), &store))
    });
    group.finish();
}

criterion_group!(benches, bench_render_pass, bench_store_write, bench_evaluate);
criterion_main!(benches);
