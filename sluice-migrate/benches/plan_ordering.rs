//! Benchmarks for migration plan resolution.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sluice_migrate::{
    ChecksumPolicy, CompositeMigrationResolver, EmbeddedResources, ResolverConfig, Version,
};
use std::hint::black_box;
use std::sync::Arc;

fn resources(count: usize) -> EmbeddedResources {
    let mut resources = EmbeddedResources::new();
    // Reverse order so sorting has work to do.
    for i in (0..count).rev() {
        let path = format!("db/migration/V{}_{}__Step_{}.sql", i / 10, i % 10, i);
        resources.add(&path, format!("CREATE TABLE t{} (id INT);\nINSERT INTO t{} VALUES (1);\n", i, i));
    }
    for i in 0..count / 10 {
        resources.add(&format!("db/migration/R__View_{}.sql", i), "SELECT 1;");
    }
    resources
}

/// Benchmark full resolution: scan, parse, checksum, dedup, sort, conflict check.
fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for count in [10, 100, 1000] {
        let scanner = Arc::new(resources(count));
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let resolver = CompositeMigrationResolver::builder(
                    ResolverConfig::new().locations(["embedded:db/migration"]),
                )
                .scanner(scanner.clone())
                .build()
                .unwrap();
                black_box(resolver.resolve_migrations().unwrap())
            })
        });
    }

    group.finish();
}

/// Benchmark version parsing and comparison.
fn bench_versions(c: &mut Criterion) {
    let mut group = c.benchmark_group("versions");

    group.bench_function("parse", |b| {
        b.iter(|| black_box(Version::parse(black_box("2024_01_15_120000.3")).unwrap()))
    });

    let versions: Vec<Version> = (0..1000)
        .rev()
        .map(|i| Version::parse(&format!("{}.{}.{}", i / 100, (i / 10) % 10, i % 10)).unwrap())
        .collect();
    group.bench_function("sort_1000", |b| {
        b.iter(|| {
            let mut sorted = versions.clone();
            sorted.sort();
            black_box(sorted)
        })
    });

    group.finish();
}

/// Benchmark checksum policies over a mid-sized script.
fn bench_checksums(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum");
    let script: String = (0..500)
        .map(|i| format!("INSERT INTO items VALUES ({}, 'item {}');\r\n", i, i))
        .collect();
    group.throughput(Throughput::Bytes(script.len() as u64));

    for policy in [
        ChecksumPolicy::RawBytes,
        ChecksumPolicy::Lines,
        ChecksumPolicy::TrimmedLines,
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(policy), &script, |b, script| {
            b.iter(|| black_box(policy.checksum_str(script)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_versions, bench_checksums);
criterion_main!(benches);
