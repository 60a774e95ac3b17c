//! Benchmarks for logkv storage operations

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use logkv::config::{Config, SyncStrategy};
use logkv::StorageKv;
use tempfile::TempDir;

fn open_engine(dir: &TempDir) -> StorageKv {
    let config = Config::builder()
        .data_dir(dir.path())
        .sync_strategy(SyncStrategy::OsBuffered)
        .build();
    StorageKv::open(config).unwrap()
}

fn storage_benchmarks(c: &mut Criterion) {
    let value = vec![b'v'; 128];

    c.bench_function("set_128b", |b| {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key{}", i % 10_000);
            engine.set(key.as_bytes(), &value).unwrap();
            i += 1;
        });
    });

    c.bench_function("get_128b", |b| {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);
        for i in 0..10_000 {
            engine.set(format!("key{}", i).as_bytes(), &value).unwrap();
        }
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key{}", i % 10_000);
            black_box(engine.get(key.as_bytes()).unwrap());
            i += 1;
        });
    });

    c.bench_function("replay_10k_records", |b| {
        let dir = TempDir::new().unwrap();
        {
            let engine = open_engine(&dir);
            for i in 0..10_000 {
                engine.set(format!("key{}", i % 1_000).as_bytes(), &value).unwrap();
            }
            engine.close().unwrap();
        }
        b.iter_batched(
            || (),
            |()| black_box(open_engine(&dir)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, storage_benchmarks);
criterion_main!(benches);
