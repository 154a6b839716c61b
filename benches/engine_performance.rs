//! Engine hot-path benchmarks.
//!
//! Measures the per-packet cost of the full pipeline on the pass path, the
//! sticky-block fast path, and the neutral path for malformed input.
//!
//! ```bash
//! cargo bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flowsentry::{frame, Engine, EngineConfig};

fn permissive_config() -> EngineConfig {
    EngineConfig {
        exfil_threshold: u64::MAX,
        dos_threshold: u64::MAX,
        ..EngineConfig::default()
    }
}

fn bench_pass_path(c: &mut Criterion) {
    let engine: Engine = Engine::with_config(permissive_config());
    let packet = frame::tcp_frame([10, 0, 0, 1], [192, 168, 1, 1], 40_000, 80, b"GET / HTTP/1.1\r\n");

    c.bench_function("process_pass_http", |b| {
        b.iter(|| engine.process(black_box(&packet)))
    });
}

fn bench_blocked_path(c: &mut Criterion) {
    let engine: Engine = Engine::with_config(permissive_config());
    let src = [203, 0, 113, 7];
    engine.block(u32::from_be_bytes(src)).expect("block table has room");
    let packet = frame::tcp_frame(src, [192, 168, 1, 1], 40_000, 80, b"x");

    c.bench_function("process_blocked_fast_path", |b| {
        b.iter(|| engine.process(black_box(&packet)))
    });
}

fn bench_malformed_path(c: &mut Criterion) {
    let engine: Engine = Engine::with_config(permissive_config());
    let runt = vec![0u8; 10];

    c.bench_function("process_malformed_neutral", |b| {
        b.iter(|| engine.process(black_box(&runt)))
    });
}

fn bench_source_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("source_fanout");
    for sources in [1u32, 16, 256] {
        let engine: Engine = Engine::with_config(permissive_config());
        let packets: Vec<Vec<u8>> = (0..sources)
            .map(|i| {
                let octets = i.to_be_bytes();
                frame::udp_frame(
                    [10, octets[1], octets[2], octets[3]],
                    [192, 168, 1, 1],
                    40_000,
                    53,
                    b"query",
                )
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(sources), &packets, |b, packets| {
            let mut i = 0usize;
            b.iter(|| {
                let verdict = engine.process(black_box(&packets[i % packets.len()]));
                i += 1;
                verdict
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_pass_path,
    bench_blocked_path,
    bench_malformed_path,
    bench_source_fanout
);
criterion_main!(benches);
