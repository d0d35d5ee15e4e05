use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use domaintally::{Engine, EngineConfig, MemoryRowSource};

const DOMAINS: [&str; 8] = [
    "example.com", "mail.org", "corp.io", "shop.co.uk",
    "uni.edu", "net.net", "x.dev", "broken",
];

fn rows(n: usize) -> Vec<Vec<String>> {
    (0..n)
        .map(|i| {
            let domain = DOMAINS[i % DOMAINS.len()];
            vec![
                format!("first{}", i),
                format!("last{}", i),
                format!("user{}@{}", i, domain),
                "Female".to_string(),
                "127.0.0.1".to_string(),
            ]
        })
        .collect()
}

fn config(chunk_capacity: usize) -> EngineConfig {
    EngineConfig::default()
        .with_chunk_capacity(chunk_capacity)
        .with_bounds(1, 10_000_000)
}

fn bench_chunk_capacity(c: &mut Criterion) {
    let input = rows(100_000);
    let mut group = c.benchmark_group("chunk_capacity");
    group.sample_size(20);

    for capacity in [100, 1000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            let engine = Engine::new(config(capacity)).unwrap();
            b.iter(|| {
                let report = engine
                    .run(MemoryRowSource::from_rows(black_box(input.clone())))
                    .unwrap();
                black_box(report.ranked.len())
            })
        });
    }

    group.finish();
}

fn bench_worker_count(c: &mut Criterion) {
    let input = rows(100_000);
    let mut group = c.benchmark_group("workers");
    group.sample_size(20);

    for workers in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            let engine = Engine::new(config(1000).with_workers(workers)).unwrap();
            b.iter(|| {
                engine
                    .run(MemoryRowSource::from_rows(black_box(input.clone())))
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_chunk_capacity, bench_worker_count);
criterion_main!(benches);
