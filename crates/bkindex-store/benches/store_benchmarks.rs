//! Benchmarks for KvStore operations

use bkindex_store::{KvStore, LmdbKvStore, LmdbStoreOptions, MemoryKvStore, WriteBatch};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn generate_value(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

fn bench_memory_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_put");

    for size in [16, 256, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let value = generate_value(size);
            let store = MemoryKvStore::new();
            let mut i = 0u64;
            b.iter(|| {
                i += 1;
                store.put(&i.to_be_bytes(), &value).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_lmdb_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("lmdb_batch");

    for ops in [1, 4, 32].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(ops), ops, |b, &ops| {
            let dir = tempfile::tempdir().unwrap();
            let store = LmdbKvStore::open(dir.path(), LmdbStoreOptions::default()).unwrap();
            let value = generate_value(64);
            let mut i = 0u64;
            b.iter(|| {
                let mut batch = WriteBatch::new();
                for _ in 0..ops {
                    i += 1;
                    batch.put(i.to_be_bytes(), &value);
                }
                store.write(batch).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let memory = MemoryKvStore::new();
    let dir = tempfile::tempdir().unwrap();
    let lmdb = LmdbKvStore::open(dir.path(), LmdbStoreOptions::default()).unwrap();

    let mut batch = WriteBatch::new();
    for i in 0..10_000u64 {
        batch.put(i.to_be_bytes(), b"value");
    }
    memory.write(batch.clone()).unwrap();
    lmdb.write(batch).unwrap();

    c.bench_function("memory_get", |b| {
        b.iter(|| black_box(memory.get(&5_000u64.to_be_bytes()).unwrap()))
    });
    c.bench_function("lmdb_get", |b| {
        b.iter(|| black_box(lmdb.get(&5_000u64.to_be_bytes()).unwrap()))
    });
}

criterion_group!(benches, bench_memory_put, bench_lmdb_batch, bench_get);
criterion_main!(benches);
