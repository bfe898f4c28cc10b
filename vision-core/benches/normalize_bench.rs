//! Normalizer benchmarks
//!
//! Run: `cargo bench --bench normalize_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};
use vision_core::protocol::{Capability, CapabilitySet};
use vision_core::providers::typed::TypedResult;
use vision_core::providers::{parse_polygon, RawAnalysis, ResponseNormalizer};

fn rest_document(lines: usize) -> Value {
    let lines: Vec<Value> = (0..lines)
        .map(|i| {
            let i = i as i64;
            json!({
                "content": format!("line {}", i),
                "boundingBox": [0, i, 100, i, 100, i + 10, 0, i + 10]
            })
        })
        .collect();

    json!({
        "captionResult": { "text": "a page of text", "confidence": 0.9 },
        "readResult": { "pages": [{ "lines": lines }] },
        "objectsResult": {
            "values": [
                { "boundingBox": { "x": 1, "y": 2, "w": 3, "h": 4 }, "tags": [{ "name": "paper", "confidence": 0.6 }] },
                { "boundingBox": { "x": 5, "y": 6, "width": 7, "height": 8 } }
            ]
        }
    })
}

fn all_capabilities() -> CapabilitySet {
    Capability::ALL.into_iter().collect()
}

fn bench_rest_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_rest");
    let requested = all_capabilities();

    for lines in [1usize, 50, 500] {
        let raw = RawAnalysis::Rest(rest_document(lines));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &raw, |b, raw| {
            b.iter(|| ResponseNormalizer::normalize("bench", black_box(raw), &requested));
        });
    }

    group.finish();
}

fn bench_typed_normalize(c: &mut Criterion) {
    let lines: Vec<Value> = (0..200)
        .map(|i| {
            json!({
                "text": format!("line {}", i),
                "boundingPolygon": [{"x": 0, "y": i}, {"x": 50, "y": i}],
                "words": [{ "text": "word", "confidence": 0.9, "boundingPolygon": [{"x": 0, "y": i}] }]
            })
        })
        .collect();
    let typed: TypedResult = match serde_json::from_value(json!({
        "readResult": { "blocks": [{ "lines": lines }] }
    })) {
        Ok(typed) => typed,
        Err(e) => panic!("bench fixture does not deserialize: {}", e),
    };
    let raw = RawAnalysis::Typed(typed);
    let requested = all_capabilities();

    c.bench_function("normalize_typed_200_lines", |b| {
        b.iter(|| ResponseNormalizer::normalize("bench", black_box(&raw), &requested));
    });
}

fn bench_parse_polygon(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_polygon");
    let flat = json!([0.5, 0.5, 10.2, 0.5, 10.2, 5.9, 0.5, 5.9]);
    let points = json!([{"x": 0, "y": 0}, {"x": 10, "y": 0}, {"x": 10, "y": 5}, {"x": 0, "y": 5}]);

    group.bench_function("flat", |b| b.iter(|| parse_polygon(black_box(&flat))));
    group.bench_function("points", |b| b.iter(|| parse_polygon(black_box(&points))));
    group.finish();
}

criterion_group!(benches, bench_rest_normalize, bench_typed_normalize, bench_parse_polygon);
criterion_main!(benches);
