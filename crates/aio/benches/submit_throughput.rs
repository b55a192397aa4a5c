//! Benchmarks for submission and completion throughput.
//!
//! Run with: `cargo bench -p aio --bench submit_throughput`
//!
//! Measures:
//! 1. Chunked reads of one file at several chunk sizes
//! 2. Whole-file loads through the engine-allocated buffer path
//! 3. Queue hand-off cost with no I/O (empty reads)

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use aio::{CompletionQueue, Engine, EngineConfig, OpenMode, Tag, Timeout};
use test_support::{patterned_bytes, scratch_dir, write_fixture};

const FILE_SIZE: usize = 4 * 1024 * 1024;

fn drain(queue: &CompletionQueue, count: usize) -> usize {
    let mut batch = Vec::with_capacity(count);
    let mut bytes = 0;
    while batch.len() < count {
        queue.try_wait_next_batch(&mut batch, count - batch.len(), Timeout::INFINITE);
    }
    for mut outcome in batch {
        bytes += outcome.transferred();
        outcome.release();
    }
    bytes
}

fn bench_chunked_reads(c: &mut Criterion) {
    let dir = scratch_dir();
    let path = write_fixture(dir.path(), "bench.bin", &patterned_bytes(FILE_SIZE)).unwrap();
    let engine = Engine::new(EngineConfig::for_large_files()).unwrap();

    let mut group = c.benchmark_group("chunked_reads");
    group.throughput(Throughput::Bytes(FILE_SIZE as u64));

    for chunk in [16 * 1024, 64 * 1024, 256 * 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            let queue = CompletionQueue::new();
            let handle = engine.open(&path, OpenMode::Read).unwrap();
            let chunks = FILE_SIZE / chunk;
            b.iter(|| {
                for i in 0..chunks {
                    handle
                        .submit_read_alloc(chunk, (i * chunk) as u64, &queue, Tag::None)
                        .unwrap();
                }
                black_box(drain(&queue, chunks))
            });
        });
    }
    group.finish();
}

fn bench_load_file(c: &mut Criterion) {
    let dir = scratch_dir();
    let path = write_fixture(dir.path(), "load.bin", &patterned_bytes(256 * 1024)).unwrap();
    let engine = Engine::new(EngineConfig::for_small_files()).unwrap();
    let queue = CompletionQueue::new();

    c.bench_function("load_file_256k", |b| {
        b.iter(|| {
            engine.load_file(&path, &queue, Tag::None).unwrap();
            black_box(drain(&queue, 1))
        });
    });
}

fn bench_queue_handoff(c: &mut Criterion) {
    let dir = scratch_dir();
    let path = write_fixture(dir.path(), "empty.bin", b"").unwrap();
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let queue = CompletionQueue::new();
    let handle = engine.open(&path, OpenMode::Read).unwrap();

    let mut group = c.benchmark_group("queue_handoff");
    for batch in [1usize, 32, 256] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            b.iter(|| {
                for _ in 0..batch {
                    handle
                        .submit_read(aio::IoBuffer::Owned(Vec::new()), 0, &queue, Tag::None)
                        .unwrap();
                }
                black_box(drain(&queue, batch))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chunked_reads, bench_load_file, bench_queue_handoff);
criterion_main!(benches);
