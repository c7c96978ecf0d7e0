use criterion::{criterion_group, criterion_main, BatchSize, Criterion, SamplingMode, Throughput};
use sslog::{ArgInput, Collector, CollectorConfig, Level};

fn benchmark_single_thread_logging(c: &mut Criterion) {
    let num_records: usize = 10_000;

    let mut group = c.benchmark_group("collector_single_thread");
    group.throughput(Throughput::Elements(num_records as u64));
    group.sampling_mode(SamplingMode::Flat);

    group.bench_function("trace_with_two_args", |b| {
        b.iter_batched(
            || {
                let dir = tempfile::tempdir().unwrap();
                let collector = Collector::new();
                collector.set_storage_path(dir.path());
                collector.set_collector_config(CollectorConfig {
                    data_buffer_bytes: 32 * 1024 * 1024,
                    string_buffer_bytes: 1024 * 1024,
                });
                collector.start().unwrap();
                (dir, collector)
            },
            |(dir, collector)| {
                for i in 0..num_records {
                    collector.log(
                        Level::Info,
                        "bench",
                        "n=%d rate=%f",
                        &[ArgInput::from(i as i32), ArgInput::from(i as f64 * 0.5)],
                        None,
                    );
                }
                collector.stop();
                drop(dir);
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_multi_thread_logging(c: &mut Criterion) {
    let threads = 4;
    let per_thread = 5_000usize;

    let mut group = c.benchmark_group("collector_multi_thread");
    group.throughput(Throughput::Elements((threads * per_thread) as u64));
    group.sampling_mode(SamplingMode::Flat);

    group.bench_function("four_producers", |b| {
        b.iter_batched(
            || {
                let dir = tempfile::tempdir().unwrap();
                let collector = Collector::new();
                collector.set_storage_path(dir.path());
                collector.set_collector_config(CollectorConfig {
                    data_buffer_bytes: 64 * 1024 * 1024,
                    string_buffer_bytes: 1024 * 1024,
                });
                collector.start().unwrap();
                (dir, collector)
            },
            |(dir, collector)| {
                let handles: Vec<_> = (0..threads)
                    .map(|tid| {
                        let collector = collector.clone();
                        std::thread::spawn(move || {
                            collector.set_thread_name(&format!("bench-{tid}"));
                            for seq in 0..per_thread {
                                collector.log(
                                    Level::Info,
                                    "bench",
                                    "tid=%d seq=%d",
                                    &[ArgInput::from(tid), ArgInput::from(seq as i32)],
                                    None,
                                );
                            }
                        })
                    })
                    .collect();
                for h in handles {
                    h.join().unwrap();
                }
                collector.stop();
                drop(dir);
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().noise_threshold(0.05);
    targets = benchmark_single_thread_logging, benchmark_multi_thread_logging
);
criterion_main!(benches);
