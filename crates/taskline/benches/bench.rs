use core::hint::black_box;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::time::Duration;
use taskline::{
    AtomicCounter, BoundedQueue, LockedCounter, Pipeline, PoolConfig, Reverse, hammer, tasks_from,
};

// Number of tasks pushed through the pipeline per iteration.
const TOTAL_TASKS: usize = 4096;

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/reverse");
    group.throughput(Throughput::Elements(TOTAL_TASKS as u64));

    let payloads: Vec<String> = (0..TOTAL_TASKS)
        .map(|i| format!("payload number {i} with some text"))
        .collect();

    for workers in [1, 2, 4, 8] {
        let pipeline = Pipeline::new(
            PoolConfig {
                workers,
                queue_capacity: 64,
                max_attempts: 1,
                collect_timeout: Some(Duration::from_secs(60)),
            },
            Reverse,
        )
        .expect("valid config");

        group.bench_with_input(BenchmarkId::new("workers", workers), &payloads, |b, p| {
            b.iter(|| {
                let report = pipeline
                    .run(tasks_from(p.iter().cloned()))
                    .expect("pipeline run");
                black_box(report);
            });
        });
    }
    group.finish();
}

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue/spsc");
    group.throughput(Throughput::Elements(TOTAL_TASKS as u64));

    for capacity in [1, 16, 256] {
        group.bench_function(BenchmarkId::new("capacity", capacity), |b| {
            b.iter(|| {
                let queue = BoundedQueue::new(capacity);
                std::thread::scope(|s| {
                    s.spawn(|| {
                        for i in 0..TOTAL_TASKS {
                            queue.enqueue(i);
                        }
                        queue.close();
                    });
                    while let Some(v) = queue.dequeue() {
                        black_box(v);
                    }
                });
            });
        });
    }
    group.finish();
}

fn bench_counters(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter/5x1000");
    group.throughput(Throughput::Elements(5_000));

    group.bench_function("locked", |b| {
        b.iter(|| black_box(hammer(&LockedCounter::default(), 5, 1000)));
    });
    group.bench_function("atomic", |b| {
        b.iter(|| black_box(hammer(&AtomicCounter::default(), 5, 1000)));
    });
    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_queue, bench_counters);
criterion_main!(benches);
