//! Analysis throughput benchmark
//!
//! Measures assembly, normalization and extraction over synthetic traces
//! mixing mutex hand-offs with a byte stream between two processes.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench pipeline
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hbgraph::extract::extract_all;
use hbgraph::log_reader::RawRecord;
use hbgraph::pipeline::analyze_records;
use hbgraph::AnalyzerConfig;
use std::collections::HashMap;

fn record(pid: u32, tid: u32, turn: u64, op: &str, args: String) -> RawRecord {
    let mut fields = HashMap::new();
    fields.insert("pid".to_string(), pid.to_string());
    fields.insert("tid".to_string(), tid.to_string());
    fields.insert("turn".to_string(), turn.to_string());
    fields.insert("op".to_string(), op.to_string());
    fields.insert("args".to_string(), args);
    RawRecord::new(1, fields)
}

/// Roughly `rounds * 6` records
fn synthetic_trace(rounds: u64) -> Vec<RawRecord> {
    let mut records = vec![
        record(1, 2, 0, "accept_first", "4 80 80".to_string()),
        record(2, 2, 1, "connect_first", "3 80 5000 0".to_string()),
        record(1, 2, 2, "accept_second", "4 80 80".to_string()),
        record(2, 2, 3, "connect_second", "3 80 5000 0".to_string()),
    ];
    let mut turn = 4;
    for round in 0..rounds {
        let tid = 3 + (round % 4) as u32;
        let mutex = format!("0x60{:02x}", round % 8);
        records.push(record(1, tid, turn, "pthread_mutex_lock", mutex.clone()));
        records.push(record(1, tid, turn + 1, "pthread_mutex_unlock", mutex));
        records.push(record(2, 2, turn + 2, "write", "0x1 3 0x20".to_string()));
        records.push(record(1, 2, turn + 3, "read_second", "0x1 4 0x10".to_string()));
        records.push(record(1, 2, turn + 4, "read_second", "0x1 4 0x10".to_string()));
        records.push(record(1, tid, turn + 5, "sched_yield", String::new()));
        turn += 6;
    }
    records
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_records");
    let sequential = AnalyzerConfig {
        parallel: false,
        ..AnalyzerConfig::default()
    };

    for rounds in [100u64, 1_000, 10_000] {
        let trace = synthetic_trace(rounds);
        group.bench_with_input(BenchmarkId::new("sequential", rounds), &trace, |b, trace| {
            b.iter(|| analyze_records(black_box(trace.clone()), &sequential).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("parallel", rounds), &trace, |b, trace| {
            b.iter(|| analyze_records(black_box(trace.clone()), &AnalyzerConfig::default()).unwrap())
        });
    }
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let graph = analyze_records(synthetic_trace(10_000), &AnalyzerConfig::default()).unwrap();
    let operations = graph.nodes().to_vec();

    c.bench_function("extract_all_10k_rounds", |b| {
        b.iter(|| extract_all(black_box(&operations), true).unwrap())
    });
}

criterion_group!(benches, bench_analyze, bench_extract);
criterion_main!(benches);
