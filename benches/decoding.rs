use criterion::{criterion_group, criterion_main, Criterion};
use jsonx::Decoder;
use pprof::criterion::{Output, PProfProfiler};
use std::fs;

/// Builds a stream of records, alternating quoted and raw strings and optional terminators
fn record_stream(count: usize) -> String {
    (0..count)
        .map(|i| {
            if i % 2 == 0 {
                format!("{{id: {}, name: `record {}`, tags: [\"a\", \"b\"], score: {}.5}};\n", i, i, i)
            } else {
                format!("{{\"id\": {}, \"name\": \"record\\t{}\", \"tags\": [], \"score\": -{}e-2}}\n", i, i, i)
            }
        })
        .collect()
}

fn decode_stream(input: &str) -> usize {
    let mut decoder = Decoder::from_str(input);
    let mut count = 0;
    while decoder.has_more() {
        if decoder.decode_next::<serde_json::Value>().is_err() {
            break;
        }
        count += 1;
    }
    count
}

fn benchmark_record_stream(c: &mut Criterion) {
    let input = record_stream(1000);
    c.bench_function("decode of 1000 record stream", |b| {
        b.iter(|| decode_stream(&input))
    });
}

fn benchmark_config(c: &mut Criterion) {
    let input = fs::read_to_string("fixtures/jsonx/valid/config.jsonx").unwrap();
    c.bench_function("decode of config", |b| {
        b.iter(|| jsonx::from_str::<serde_json::Value>(&input).unwrap())
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = benchmark_record_stream, benchmark_config
}
criterion_main!(benches);
